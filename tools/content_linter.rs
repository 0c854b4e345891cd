/// Content Linter: validates a scene pack before it ships.
///
/// Usage: content_linter <pack_dir> [--strict]
///
/// Exits non-zero on errors. With --strict, warnings count as errors.
use scene_engine::core::config::EngineConfig;
use scene_engine::core::content::ContentSet;
use scene_engine::core::random_event::total_weight;
use std::path::Path;
use std::process;

fn main() {
    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 || args[1] == "--help" || args[1] == "-h" {
        println!("Usage: content_linter <pack_dir> [--strict]");
        process::exit(0);
    }

    let pack_dir = Path::new(&args[1]);
    let strict = args[2..].iter().any(|a| a == "--strict");

    if !pack_dir.is_dir() {
        eprintln!("ERROR: Path '{}' is not a directory", pack_dir.display());
        process::exit(1);
    }

    let content = match ContentSet::load_from_dir(pack_dir) {
        Ok(content) => content,
        Err(e) => {
            eprintln!("ERROR: Failed to load pack: {}", e);
            process::exit(1);
        }
    };

    let engine_path = pack_dir.join("engine.ron");
    let config = if engine_path.exists() {
        match EngineConfig::load_from_ron(&engine_path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("ERROR: Failed to load engine.ron: {}", e);
                process::exit(1);
            }
        }
    } else {
        EngineConfig::default()
    };

    println!(
        "Loaded {} scenes, {} enemies, {} endings, {} companions",
        content.scenes.len(),
        content.enemies.len(),
        content.endings.len(),
        content.companions.len()
    );

    let (errors, warnings) = lint_content(&content, &config);

    println!("\n=== Content Lint Report ===\n");

    if errors.is_empty() && warnings.is_empty() {
        println!("All checks passed!");
    }

    for warning in &warnings {
        println!("WARNING: {}", warning);
    }

    for error in &errors {
        println!("ERROR: {}", error);
    }

    println!(
        "\nSummary: {} errors, {} warnings",
        errors.len(),
        warnings.len()
    );

    if errors.is_empty() && !(strict && !warnings.is_empty()) {
        process::exit(0);
    } else {
        process::exit(1);
    }
}

fn lint_content(content: &ContentSet, config: &EngineConfig) -> (Vec<String>, Vec<String>) {
    let mut errors = Vec::new();
    let mut warnings = Vec::new();

    if let Err(e) = content.validate(config) {
        errors.push(e.to_string());
    }

    for (scene, target) in content.dangling_targets() {
        warnings.push(format!(
            "Scene '{}' has a choice leading to undefined scene '{}'",
            scene, target
        ));
    }

    for scene in content.unreachable_scenes(&config.start_scene) {
        warnings.push(format!(
            "Scene '{}' is unreachable from '{}'",
            scene, config.start_scene
        ));
    }

    for (location, flag) in content.unknown_flags() {
        warnings.push(format!(
            "'{}' references flag '{}' the player never carries",
            location, flag
        ));
    }

    for id in content.scene_ids() {
        let Some(scene) = content.scene(id) else {
            continue;
        };
        if scene.is_combat() && scene.choices.is_empty() {
            errors.push(format!(
                "Combat scene '{}' has no choices to continue with after victory",
                id
            ));
        }
        if scene.choices.is_empty() && !scene.is_combat() {
            warnings.push(format!("Scene '{}' is a dead end", id));
        }
        for (index, choice) in scene.choices.iter().enumerate() {
            if !choice.random_events.is_empty() && total_weight(&choice.random_events) == 0 {
                warnings.push(format!(
                    "Choice {} of '{}' has random events with zero total weight",
                    index, id
                ));
            }
        }
    }

    for ending in &content.endings {
        if ending.requirements.is_empty() && ending.id != config.void_ending {
            warnings.push(format!(
                "Ending '{}' has no requirements and can never be reached",
                ending.id
            ));
        }
    }

    for companion in content.companions.keys() {
        if !content.dialogue.companions().any(|c| c == companion.as_str()) {
            warnings.push(format!("Companion '{}' has no dialogue", companion));
        }
    }

    (errors, warnings)
}
