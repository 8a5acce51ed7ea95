/// Play — interactive terminal player for story project files.
///
/// Usage: play --project <path> [--stage <id>] [--chapter <id>] [--instant]
///
/// Commands:
///   (enter)        — advance past the current node
///   <n>            — select choice n (1-based)
///   vars           — print gold, hp, flags, affection, reputation
///   history        — print the scrollback log
///   images         — print the active image layers
///   save <path>    — write the game state to a file
///   load <path>    — restore a previously saved state
///   restart        — restart the current chapter from scratch
///   help           — list commands
///   quit           — exit

use std::io::{self, BufRead, Write};
use std::time::Duration;

use storynode_engine::core::engine::GameEngine;
use storynode_engine::core::timing::{Clock, SystemClock};
use storynode_engine::core::typewriter::{RevealMode, Typewriter};
use storynode_engine::schema::node::StoryNode;
use storynode_engine::schema::project::StoryProject;

fn main() {
    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 || args[1] == "--help" || args[1] == "-h" {
        print_usage();
        return;
    }

    let mut project_path = None;
    let mut stage_id = None;
    let mut chapter_id = None;
    let mut instant = false;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--project" if i + 1 < args.len() => {
                i += 1;
                project_path = Some(args[i].clone());
            }
            "--stage" if i + 1 < args.len() => {
                i += 1;
                stage_id = Some(args[i].clone());
            }
            "--chapter" if i + 1 < args.len() => {
                i += 1;
                chapter_id = Some(args[i].clone());
            }
            "--instant" => {
                instant = true;
            }
            _ => {
                eprintln!("Unknown argument: {}", args[i]);
                print_usage();
                std::process::exit(1);
            }
        }
        i += 1;
    }

    let Some(project_path) = project_path else {
        eprintln!("Missing --project <path>");
        print_usage();
        std::process::exit(1);
    };

    let raw = match std::fs::read_to_string(&project_path) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("ERROR reading {}: {}", project_path, e);
            std::process::exit(1);
        }
    };
    let project: StoryProject = match serde_json::from_str(&raw) {
        Ok(p) => p,
        Err(e) => {
            eprintln!("ERROR parsing {}: {}", project_path, e);
            std::process::exit(1);
        }
    };

    println!("Loaded '{}' ({} stages)", project.name, project.stages.len());
    println!("Type 'help' for commands.\n");

    let mode = if instant {
        RevealMode::Instant
    } else {
        RevealMode::Typewriter
    };
    let mut typewriter = Typewriter::new(mode);
    let mut engine = GameEngine::new(project);

    if let Err(e) = engine.start(stage_id.as_deref(), chapter_id.as_deref()) {
        eprintln!("ERROR: {}", e);
        std::process::exit(1);
    }
    settle(&mut engine);
    render(&engine, &mut typewriter);

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    loop {
        print!("> ");
        stdout.flush().ok();

        let mut line = String::new();
        if stdin.lock().read_line(&mut line).is_err() || line.is_empty() {
            break;
        }
        let line = line.trim();

        if line.is_empty() {
            engine.advance();
            settle(&mut engine);
            render(&engine, &mut typewriter);
            continue;
        }

        let parts: Vec<&str> = line.split_whitespace().collect();
        let cmd = parts[0].to_lowercase();

        match cmd.as_str() {
            "quit" | "exit" | "q" => {
                println!("Goodbye.");
                break;
            }
            "help" | "h" | "?" => {
                print_help();
            }
            "vars" => {
                let vars = engine.variables();
                println!("gold: {}  hp: {}", vars.gold, vars.hp);
                for (key, value) in &vars.flags {
                    println!("flag {} = {:?}", key, value);
                }
                for (id, value) in &vars.affection {
                    println!("affection {} = {}", id, value);
                }
                for (id, value) in &vars.reputation {
                    println!("reputation {} = {}", id, value);
                }
            }
            "history" => {
                for entry in engine.history() {
                    let who = entry.speaker.as_deref().unwrap_or("");
                    match &entry.choice_text {
                        Some(text) => println!("[{}] {} -> {}", entry.kind.as_str(), entry.content, text),
                        None if who.is_empty() => println!("[{}] {}", entry.kind.as_str(), entry.content),
                        None => println!("[{}] {}: {}", entry.kind.as_str(), who, entry.content),
                    }
                }
            }
            "images" => {
                for img in &engine.state().active_images {
                    println!(
                        "{:?}/{} {} (instance {})",
                        img.layer, img.layer_order, img.resource_path, img.instance_id
                    );
                }
            }
            "save" => {
                if parts.len() < 2 {
                    println!("Usage: save <path>");
                    continue;
                }
                match engine.save() {
                    Ok(data) => match std::fs::write(parts[1], data) {
                        Ok(()) => println!("Saved to {}", parts[1]),
                        Err(e) => println!("ERROR writing {}: {}", parts[1], e),
                    },
                    Err(e) => println!("ERROR: {}", e),
                }
            }
            "load" => {
                if parts.len() < 2 {
                    println!("Usage: load <path>");
                    continue;
                }
                match std::fs::read_to_string(parts[1]) {
                    Ok(data) => match engine.load(&data) {
                        Ok(()) => {
                            println!("Loaded {}", parts[1]);
                            render(&engine, &mut typewriter);
                        }
                        Err(e) => println!("ERROR: {}", e),
                    },
                    Err(e) => println!("ERROR reading {}: {}", parts[1], e),
                }
            }
            "restart" => match engine.restart() {
                Ok(()) => {
                    settle(&mut engine);
                    render(&engine, &mut typewriter);
                }
                Err(e) => println!("ERROR: {}", e),
            },
            _ => match cmd.parse::<usize>() {
                Ok(n) if n >= 1 => {
                    engine.select_choice(n - 1);
                    settle(&mut engine);
                    render(&engine, &mut typewriter);
                }
                _ => {
                    println!("Unknown command: '{}'. Type 'help' for available commands.", cmd);
                }
            },
        }
    }
}

/// Sleep through any scheduled image-effect auto-advance so the shell
/// always prompts at a settled node.
fn settle(engine: &mut GameEngine) {
    let clock = SystemClock;
    while let Some(pending) = engine.pending_auto_advance() {
        let wait = pending.fires_at.saturating_sub(clock.now_ms());
        std::thread::sleep(Duration::from_millis(wait));
        engine.tick();
    }
}

fn render(engine: &GameEngine, typewriter: &mut Typewriter) {
    let Some(node) = engine.current_node() else {
        println!("(no active node)");
        return;
    };

    match node {
        StoryNode::Dialogue { speaker, .. } => {
            if let Some(name) = speaker {
                println!("{}:", name);
            }
            print_with_reveal(node.text().unwrap_or(""), typewriter);
        }
        StoryNode::Choice { choices, .. } => {
            print_with_reveal(node.text().unwrap_or(""), typewriter);
            for (i, choice) in choices.iter().enumerate() {
                let allowed = choice
                    .condition
                    .as_ref()
                    .map_or(true, |c| engine.check_condition(c));
                let marker = if allowed { " " } else { "x" };
                println!("  [{}] {} {}", i + 1, marker, choice.text);
            }
        }
        StoryNode::ChapterEnd { .. } => {
            let text = node.text().unwrap_or("(End of chapter)");
            println!("{}", text);
        }
        _ => {
            if let Some(text) = node.text() {
                print_with_reveal(text, typewriter);
            }
        }
    }
}

fn print_with_reveal(text: &str, typewriter: &mut Typewriter) {
    let clock = SystemClock;
    typewriter.set_text(text, clock.now_ms());
    let mut shown = 0;

    let mut stdout = io::stdout();
    while typewriter.is_revealing() {
        std::thread::sleep(Duration::from_millis(15));
        typewriter.tick(clock.now_ms());
        let visible = typewriter.visible();
        let fresh: String = visible.chars().skip(shown).collect();
        shown = visible.chars().count();
        print!("{}", fresh);
        stdout.flush().ok();
    }
    let tail: String = typewriter.full_text().chars().skip(shown).collect();
    println!("{}", tail);
}

fn print_usage() {
    println!("Play — interactive terminal player for story project files.");
    println!();
    println!("Usage: play --project <path> [--stage <id>] [--chapter <id>] [--instant]");
    println!();
    println!("  --project <path>  Path to a story project JSON file");
    println!("  --stage <id>      Stage to start (default: first)");
    println!("  --chapter <id>    Chapter to start (default: first)");
    println!("  --instant         Disable the typewriter reveal");
}

fn print_help() {
    println!("Commands:");
    println!("  (enter)        Advance past the current node");
    println!("  <n>            Select choice n (1-based)");
    println!("  vars           Print gold, hp, flags, affection, reputation");
    println!("  history        Print the scrollback log");
    println!("  images         Print the active image layers");
    println!("  save <path>    Write the game state to a file");
    println!("  load <path>    Restore a previously saved state");
    println!("  restart        Restart the current chapter from scratch");
    println!("  help           Show this help");
    println!("  quit           Exit");
}
