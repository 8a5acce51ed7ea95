/// Image layer manager — slot occupancy for the layered display.
///
/// At most one active image per (layer, layer_order) slot. Every
/// insertion gets a fresh `instance_id` so the shell re-triggers enter
/// animations even when the same resource re-enters the same slot.
use crate::schema::node::ImageData;
use crate::schema::state::ActiveImage;

#[derive(Debug, Clone, Default)]
pub struct ImageLayers {
    next_instance: u64,
}

impl ImageLayers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply an image directive to the active set: evict the slot's
    /// occupant, then insert a replacement unless this is a removal.
    pub fn apply_directive(
        &mut self,
        active: &mut Vec<ActiveImage>,
        node_id: &str,
        data: &ImageData,
    ) {
        let (layer, order) = data.slot();
        active.retain(|img| !(img.layer == layer && img.layer_order == order));

        if data.is_removal() {
            return;
        }

        self.next_instance += 1;
        active.push(ActiveImage {
            id: node_id.to_string(),
            instance_id: self.next_instance,
            resource_path: data.resource_path.clone(),
            layer,
            layer_order: order,
            alignment: data.alignment,
            x: data.x,
            y: data.y,
            flip_horizontal: data.flip_horizontal,
            effects: data.active_effects(),
            effect_duration: data.effect_duration,
        });
    }

    /// Resynchronize the instance counter after loading a save, so new
    /// insertions keep discriminating against restored entries.
    pub fn resync(&mut self, active: &[ActiveImage]) {
        let highest = active.iter().map(|img| img.instance_id).max().unwrap_or(0);
        self.next_instance = self.next_instance.max(highest);
    }
}
