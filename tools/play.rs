/// Play - interactive shell for walking a content pack.
///
/// Usage: play --content <dir> [--seed <n>] [--save <file>]
///
/// Commands:
///   choose <n>            - take choice n (1-based)
///   attack                - attack the current enemy
///   flee                  - try to escape combat
///   recruit <id> [name]   - recruit a companion
///   wait [ms]             - let time pass (fires the post-victory advance)
///   save / load           - write or read the save file
///   reset                 - start over
///   status                - show player, companion and combat state
///   log                   - show the full narrative log
///   help                  - list commands
///   quit                  - exit

use scene_engine::core::combat::CombatState;
use scene_engine::core::persistence::{FileSink, MemorySink, SaveSink};
use scene_engine::core::session::GameSession;
use std::io::{self, BufRead, Write};
use std::time::Duration;
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 || args[1] == "--help" || args[1] == "-h" {
        print_usage();
        return;
    }

    let mut content_dir = None;
    let mut seed = None;
    let mut save_path = None;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--content" if i + 1 < args.len() => {
                i += 1;
                content_dir = Some(args[i].clone());
            }
            "--seed" if i + 1 < args.len() => {
                i += 1;
                match args[i].parse::<u64>() {
                    Ok(s) => seed = Some(s),
                    Err(_) => {
                        eprintln!("Invalid seed: {}", args[i]);
                        std::process::exit(1);
                    }
                }
            }
            "--save" if i + 1 < args.len() => {
                i += 1;
                save_path = Some(args[i].clone());
            }
            _ => {
                eprintln!("Unknown argument: {}", args[i]);
                print_usage();
                std::process::exit(1);
            }
        }
        i += 1;
    }

    let Some(content_dir) = content_dir else {
        eprintln!("Missing --content <dir>");
        print_usage();
        std::process::exit(1);
    };

    let mut builder = GameSession::builder().content_dir(&content_dir);
    if let Some(seed) = seed {
        builder = builder.seed(seed);
    }
    let mut session = match builder.build() {
        Ok(session) => session,
        Err(e) => {
            eprintln!("ERROR: {}", e);
            std::process::exit(1);
        }
    };

    let mut sink: Box<dyn SaveSink> = match save_path {
        Some(path) => Box::new(FileSink::new(path)),
        None => Box::new(MemorySink::new()),
    };

    println!(
        "Loaded {} scenes from {}",
        session.content().scenes.len(),
        content_dir
    );
    println!("Seed: {}", session.seed());
    println!("Type 'help' for commands.\n");

    let mut seen = Vec::new();
    print_new_log(&session, &mut seen);
    print_scene(&session);

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    loop {
        print!("play> ");
        stdout.flush().ok();

        let mut line = String::new();
        if stdin.lock().read_line(&mut line).is_err() || line.is_empty() {
            break;
        }
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let parts: Vec<&str> = line.split_whitespace().collect();
        let cmd = parts[0].to_lowercase();
        let scene_before = session.scene_id().to_string();

        match cmd.as_str() {
            "quit" | "exit" | "q" => {
                println!("Goodbye.");
                break;
            }
            "help" | "h" | "?" => print_help(),
            "choose" | "c" => {
                let Some(n) = parts.get(1).and_then(|p| p.parse::<usize>().ok()) else {
                    println!("Usage: choose <n>");
                    continue;
                };
                if let Err(e) = session.advance(n.saturating_sub(1)) {
                    println!("[{}]", e);
                }
            }
            "attack" | "a" => match session.attack() {
                Ok(turn) => {
                    if turn.outcome.is_some() {
                        println!("[combat over: {:?}]", turn.outcome);
                    }
                }
                Err(e) => println!("[{}]", e),
            },
            "flee" | "f" => {
                if let Err(e) = session.flee() {
                    println!("[{}]", e);
                }
            }
            "recruit" => {
                let Some(id) = parts.get(1) else {
                    println!("Usage: recruit <id> [name]");
                    continue;
                };
                let name = if parts.len() > 2 {
                    Some(parts[2..].join(" "))
                } else {
                    None
                };
                if let Err(e) = session.recruit_companion(id, name.as_deref()) {
                    println!("[{}]", e);
                }
            }
            "wait" | "w" => {
                let ms = parts
                    .get(1)
                    .and_then(|p| p.parse::<u64>().ok())
                    .or_else(|| session.pending_advance().map(|p| p.remaining_ms))
                    .unwrap_or(0);
                if let Err(e) = session.tick(Duration::from_millis(ms)) {
                    println!("[{}]", e);
                }
            }
            "save" => {
                if let Err(e) = session.save(sink.as_mut()) {
                    println!("[{}]", e);
                }
            }
            "load" => {
                if let Err(e) = session.load(sink.as_ref()) {
                    println!("[{}]", e);
                }
                seen.clear();
            }
            "reset" => {
                session.reset();
                seen.clear();
                println!("Seed: {}", session.seed());
            }
            "status" | "s" => print_status(&session),
            "log" => {
                for line in session.log().lines() {
                    println!("  {}", line);
                }
                continue;
            }
            _ => {
                println!(
                    "Unknown command: '{}'. Type 'help' for available commands.",
                    cmd
                );
                continue;
            }
        }

        print_new_log(&session, &mut seen);
        if session.is_terminal() {
            print_ending(&session);
        } else if session.scene_id() != scene_before || cmd == "reset" || cmd == "load" {
            print_scene(&session);
        } else if session.is_combat_active() {
            print_combat(&session);
        }
    }
}

/// Print log lines added since the last call. The log is a bounded ring, so
/// new lines are found by overlapping the previous tail with the current one.
fn print_new_log(session: &GameSession, seen: &mut Vec<String>) {
    let lines: Vec<String> = session.log().lines().map(str::to_string).collect();
    let overlap = (0..=seen.len())
        .find(|&skip| lines.starts_with(&seen[skip..]))
        .map_or(0, |skip| seen.len() - skip);
    for line in &lines[overlap..] {
        println!("  | {}", line);
    }
    *seen = lines;
}

fn print_scene(session: &GameSession) {
    let Some(scene) = session.scene() else {
        println!("(scene '{}' is missing)", session.scene_id());
        return;
    };
    println!("\n=== {} ===", scene.title);
    for line in &scene.text {
        println!("{}", line);
    }
    if let Some(ref sound) = scene.ambient_sound {
        println!("[{}]", sound);
    }
    println!();

    if session.is_combat_active() {
        print_combat(session);
        return;
    }
    for (i, (choice, available)) in session.choices().iter().enumerate() {
        let marker = if *available { " " } else { "x" };
        println!("  {}{}. {}", marker, i + 1, choice.text);
    }
}

fn print_combat(session: &GameSession) {
    for line in session.combat_log() {
        println!("  ~ {}", line);
    }
    if let Some(encounter) = session.combat().encounter() {
        println!(
            "  {}: {}/{} HP   You: {}/{} HP",
            encounter.enemy.name,
            encounter.enemy_health,
            encounter.enemy.max_health,
            session.player().health,
            session.player().max_health
        );
        println!("  (attack | flee)");
    }
}

fn print_status(session: &GameSession) {
    let player = session.player();
    println!("Scene:      {}", session.scene_id());
    println!("Health:     {}/{}", player.health, player.max_health);
    println!("Sanity:     {}/{}", player.sanity, player.max_sanity);
    println!("Corruption: {}", player.corruption);
    println!(
        "Stats:      STR {} / WIL {} / ARC {}",
        player.stats.strength, player.stats.willpower, player.stats.arcane
    );
    println!("Weapon:     {}", player.weapon);
    println!("Inventory:  {}", player.inventory.join(", "));
    for (name, value) in &player.flags {
        println!("  {} = {}", name, value);
    }
    match session.companion() {
        Some(c) => println!(
            "Companion:  {} the {} (loyalty {}, {:?})",
            c.name, c.species, c.loyalty, c.ability
        ),
        None => println!("Companion:  none"),
    }
    match session.combat() {
        CombatState::Idle => println!("Combat:     none"),
        CombatState::Active(e) => {
            println!("Combat:     vs {} ({} HP)", e.enemy.name, e.enemy_health)
        }
        CombatState::Resolved(outcome) => println!("Combat:     resolved ({:?})", outcome),
    }
    if let Some(pending) = session.pending_advance() {
        println!("Pending:    advance in {} ms", pending.remaining_ms);
    }
    println!("Seed:       {}", session.seed());
}

fn print_ending(session: &GameSession) {
    let Some(ending) = session.ending() else {
        return;
    };
    println!("\n*** {} ***", ending.title);
    println!("{}", ending.description);
    if let Some(ref message) = ending.unlock_message {
        println!("\n{}", message);
    }
    println!("\n(reset to play again, or quit)");
}

fn print_usage() {
    println!("Play - interactive shell for walking a content pack");
    println!();
    println!("Usage: play --content <dir> [--seed <n>] [--save <file>]");
    println!();
    println!("Options:");
    println!("  --content <dir>    Content pack directory (e.g. content/doom_exe)");
    println!("  --seed <n>         RNG seed (default: fresh entropy)");
    println!("  --save <file>      Save file (default: in-memory only)");
}

fn print_help() {
    println!("Commands:");
    println!("  choose <n>            Take choice n (1-based)");
    println!("  attack                Attack the current enemy");
    println!("  flee                  Try to escape combat");
    println!("  recruit <id> [name]   Recruit a companion");
    println!("  wait [ms]             Let time pass");
    println!("  save / load           Write or read the save file");
    println!("  reset                 Start over");
    println!("  status                Show player state");
    println!("  log                   Show the full narrative log");
    println!("  help                  Show this help");
    println!("  quit                  Exit");
}
