use pretty_assertions::assert_eq;

use storynode_engine::core::engine::{EngineError, GameEngine};
use storynode_engine::core::timing::ManualClock;
use storynode_engine::schema::project::StoryProject;
use storynode_engine::schema::state::GameState;

const PROJECT: &str = r#"{
    "name": "Lighthouse", "version": "1",
    "variables": {"gold": 30, "hp": 80},
    "stages": [{"id": "s", "title": "S", "chapters": [{
        "id": "c", "title": "C", "startNodeId": "start",
        "nodes": [
            {"id": "start", "type": "start", "nextNodeId": "bg"},
            {"id": "bg", "type": "image", "nextNodeId": "fork",
             "imageData": {"resourcePath": "shore.png", "layer": "background"}},
            {"id": "fork", "type": "choice", "text": "The door is ajar.", "choices": [
                {"id": "enter", "text": "Step inside", "nextNodeId": "hall",
                 "effects": {"gold": -10}}
            ]},
            {"id": "hall", "type": "dialogue", "speaker": "Mira", "text": "You came back."}
        ]
    }]}]
}"#;

fn engine_with(clock: ManualClock) -> GameEngine {
    let project: StoryProject = serde_json::from_str(PROJECT).unwrap();
    let mut engine = GameEngine::builder(project).clock(clock).build();
    engine.start(None, None).unwrap();
    engine
}

#[test]
fn save_then_load_restores_the_full_state() {
    let clock = ManualClock::new(1_000);
    let mut engine = engine_with(clock.clone());
    engine.advance();
    engine.select_choice(0);
    clock.advance(5_000);

    let save = engine.save().unwrap();
    let before = engine.state().clone();

    // A different session, later in wall time.
    let clock2 = ManualClock::new(50_000);
    let mut restored = engine_with(clock2.clone());
    restored.load(&save).unwrap();

    let after = restored.state();
    assert_eq!(after.current_node_id, before.current_node_id);
    assert_eq!(after.variables, before.variables);
    assert_eq!(after.history, before.history);
    assert_eq!(after.active_images, before.active_images);
    assert_eq!(after.started_at, 50_000, "session timestamp resets on load");
    assert_eq!(after.play_time, 5_000, "play time carried over in the save");
}

#[test]
fn play_time_accumulates_across_sessions() {
    let clock = ManualClock::new(0);
    let mut engine = engine_with(clock.clone());
    clock.advance(3_000);
    let first = engine.save().unwrap();

    let clock2 = ManualClock::new(90_000);
    let mut engine2 = engine_with(clock2.clone());
    engine2.load(&first).unwrap();
    clock2.advance(2_000);

    let second = engine2.save().unwrap();
    let snapshot: GameState = serde_json::from_str(&second).unwrap();
    assert_eq!(snapshot.play_time, 5_000, "offline gap is not credited");
}

#[test]
fn malformed_save_leaves_state_untouched() {
    let clock = ManualClock::new(0);
    let mut engine = engine_with(clock.clone());
    engine.advance();
    let before = engine.state().clone();

    let err = engine.load("{not json").unwrap_err();
    assert!(matches!(err, EngineError::MalformedSave(_)));
    assert_eq!(*engine.state(), before);
}

#[test]
fn save_wire_format_is_camel_case() {
    let engine = engine_with(ManualClock::new(0));
    let save = engine.save().unwrap();
    assert!(save.contains(r#""currentNodeId""#));
    assert!(save.contains(r#""playTime""#));
    let value: serde_json::Value = serde_json::from_str(&save).unwrap();
    assert_eq!(value["variables"]["gold"], 30);
    assert_eq!(value["variables"]["hp"], 80);
}

#[test]
fn loaded_saves_tolerate_unknown_fields() {
    let clock = ManualClock::new(0);
    let mut engine = engine_with(clock);
    let mut value: serde_json::Value =
        serde_json::from_str(&engine.save().unwrap()).unwrap();
    value["uiSettings"] = serde_json::json!({"volume": 0.5});

    engine.load(&value.to_string()).unwrap();
    assert_eq!(engine.state().current_node_id, "start");
}

#[test]
fn image_instances_stay_unique_after_load() {
    let clock = ManualClock::new(0);
    let mut engine = engine_with(clock.clone());
    engine.advance(); // through the image node to the fork
    let save = engine.save().unwrap();

    let clock2 = ManualClock::new(0);
    let mut restored = engine_with(clock2);
    restored.load(&save).unwrap();
    let loaded_instance = restored.state().active_images[0].instance_id;

    // Replaying the same image must not collide with the restored one.
    restored.restart().unwrap();
    restored.advance();
    assert!(restored.state().active_images[0].instance_id > loaded_instance);
}
