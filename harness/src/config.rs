//! Command-line configuration for the two tournament modes.

use std::env::consts::DLL_EXTENSION;
use std::path::{Path, PathBuf};

use anyhow::bail;

/// Which tournament to run, with the mode-specific paths.
#[derive(Debug, Clone)]
pub enum Mode {
    Comparative {
        game_map: PathBuf,
        game_managers_folder: PathBuf,
        algorithm1: PathBuf,
        algorithm2: PathBuf,
    },
    Competition {
        game_maps_folder: PathBuf,
        game_manager: PathBuf,
        algorithms_folder: PathBuf,
    },
}

/// Parsed and path-validated run configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub mode: Mode,
    pub num_threads: usize,
    pub verbose: bool,
    pub debug: bool,
}

impl Config {
    /// Parse `key=value` style arguments (without the program name).
    pub fn parse(args: &[String]) -> anyhow::Result<Config> {
        let mut comparative = false;
        let mut competition = false;
        let mut verbose = false;
        let mut debug = false;
        let mut num_threads = 1usize;
        let mut game_map = None;
        let mut game_managers_folder = None;
        let mut algorithm1 = None;
        let mut algorithm2 = None;
        let mut game_maps_folder = None;
        let mut game_manager = None;
        let mut algorithms_folder = None;
        let mut unsupported = Vec::new();

        for arg in args {
            match arg.as_str() {
                "--comparative" => comparative = true,
                "--competition" => competition = true,
                "--verbose" => verbose = true,
                "--debug" => debug = true,
                other => {
                    if let Some(value) = other.strip_prefix("num_threads=") {
                        let Ok(n) = value.parse::<usize>() else {
                            bail!("num_threads is not a number: '{value}'");
                        };
                        num_threads = n.max(1);
                    } else if let Some(value) = other.strip_prefix("game_map=") {
                        game_map = Some(PathBuf::from(value));
                    } else if let Some(value) = other.strip_prefix("game_managers_folder=") {
                        game_managers_folder = Some(PathBuf::from(value));
                    } else if let Some(value) = other.strip_prefix("algorithm1=") {
                        algorithm1 = Some(PathBuf::from(value));
                    } else if let Some(value) = other.strip_prefix("algorithm2=") {
                        algorithm2 = Some(PathBuf::from(value));
                    } else if let Some(value) = other.strip_prefix("game_maps_folder=") {
                        game_maps_folder = Some(PathBuf::from(value));
                    } else if let Some(value) = other.strip_prefix("game_manager=") {
                        game_manager = Some(PathBuf::from(value));
                    } else if let Some(value) = other.strip_prefix("algorithms_folder=") {
                        algorithms_folder = Some(PathBuf::from(value));
                    } else {
                        unsupported.push(other.to_string());
                    }
                }
            }
        }

        if !unsupported.is_empty() {
            bail!("unsupported arguments: {}", unsupported.join(" "));
        }
        if comparative == competition {
            bail!("must specify exactly one of --comparative or --competition");
        }

        let mode = if comparative {
            let mut missing = Vec::new();
            if game_map.is_none() {
                missing.push("game_map");
            }
            if game_managers_folder.is_none() {
                missing.push("game_managers_folder");
            }
            if algorithm1.is_none() {
                missing.push("algorithm1");
            }
            if algorithm2.is_none() {
                missing.push("algorithm2");
            }
            if !missing.is_empty() {
                bail!("missing arguments: {}", missing.join(" "));
            }
            Mode::Comparative {
                game_map: game_map.unwrap(),
                game_managers_folder: game_managers_folder.unwrap(),
                algorithm1: algorithm1.unwrap(),
                algorithm2: algorithm2.unwrap(),
            }
        } else {
            let mut missing = Vec::new();
            if game_maps_folder.is_none() {
                missing.push("game_maps_folder");
            }
            if game_manager.is_none() {
                missing.push("game_manager");
            }
            if algorithms_folder.is_none() {
                missing.push("algorithms_folder");
            }
            if !missing.is_empty() {
                bail!("missing arguments: {}", missing.join(" "));
            }
            Mode::Competition {
                game_maps_folder: game_maps_folder.unwrap(),
                game_manager: game_manager.unwrap(),
                algorithms_folder: algorithms_folder.unwrap(),
            }
        };

        let config = Config { mode, num_threads, verbose, debug };
        config.validate_paths()?;
        Ok(config)
    }

    fn validate_paths(&self) -> anyhow::Result<()> {
        match &self.mode {
            Mode::Comparative { game_map, game_managers_folder, algorithm1, algorithm2 } => {
                must_be_file(game_map, "game_map")?;
                must_be_dir(game_managers_folder, "game_managers_folder")?;
                must_be_file(algorithm1, "algorithm1")?;
                must_be_file(algorithm2, "algorithm2")?;
                must_hold_plugins(game_managers_folder, "game_managers_folder")?;
            }
            Mode::Competition { game_maps_folder, game_manager, algorithms_folder } => {
                must_be_dir(game_maps_folder, "game_maps_folder")?;
                must_be_file(game_manager, "game_manager")?;
                must_be_dir(algorithms_folder, "algorithms_folder")?;
                must_hold_plugins(algorithms_folder, "algorithms_folder")?;
            }
        }
        Ok(())
    }
}

fn must_be_file(path: &Path, name: &str) -> anyhow::Result<()> {
    if !path.is_file() {
        bail!("{name} is not a file: {}", path.display());
    }
    Ok(())
}

fn must_be_dir(path: &Path, name: &str) -> anyhow::Result<()> {
    if !path.is_dir() {
        bail!("{name} is not a directory: {}", path.display());
    }
    Ok(())
}

/// A plugin folder must contain at least one dynamic library.
fn must_hold_plugins(dir: &Path, name: &str) -> anyhow::Result<()> {
    let entries = std::fs::read_dir(dir)?;
    for entry in entries.flatten() {
        if entry.path().extension().is_some_and(|ext| ext == DLL_EXTENSION) {
            return Ok(());
        }
    }
    bail!("{name} contains no .{DLL_EXTENSION} files");
}

/// Usage text printed alongside configuration errors.
pub fn usage(prog: &str) -> String {
    format!(
        "Usage:\n\
         \x20 Comparative mode:\n\
         \x20   {prog} --comparative game_map=<file> game_managers_folder=<dir> \\\n\
         \x20     algorithm1=<file> algorithm2=<file> [num_threads=<n>] [--verbose] [--debug]\n\
         \x20 Competition mode:\n\
         \x20   {prog} --competition game_maps_folder=<dir> game_manager=<file> \\\n\
         \x20     algorithms_folder=<dir> [num_threads=<n>] [--verbose] [--debug]\n"
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    fn plugin_file(dir: &Path, stem: &str) -> PathBuf {
        let path = dir.join(format!("{stem}.{DLL_EXTENSION}"));
        drop(File::create(&path).unwrap());
        path
    }

    #[test]
    fn parses_comparative_mode() {
        let dir = tempfile::tempdir().unwrap();
        let map = dir.path().join("battle.txt");
        drop(File::create(&map).unwrap());
        let gms = dir.path().join("gms");
        std::fs::create_dir(&gms).unwrap();
        drop(plugin_file(&gms, "ref"));
        let a1 = plugin_file(dir.path(), "alpha");
        let a2 = plugin_file(dir.path(), "beta");

        let config = Config::parse(&args(&[
            "--comparative",
            &format!("game_map={}", map.display()),
            &format!("game_managers_folder={}", gms.display()),
            &format!("algorithm1={}", a1.display()),
            &format!("algorithm2={}", a2.display()),
            "num_threads=4",
            "--verbose",
        ]))
        .unwrap();

        assert!(matches!(config.mode, Mode::Comparative { .. }));
        assert_eq!(config.num_threads, 4);
        assert!(config.verbose);
        assert!(!config.debug);
    }

    #[test]
    fn rejects_both_modes() {
        let err = Config::parse(&args(&["--comparative", "--competition"])).unwrap_err();
        assert!(err.to_string().contains("exactly one"));
    }

    #[test]
    fn rejects_neither_mode() {
        assert!(Config::parse(&args(&["num_threads=2"])).is_err());
    }

    #[test]
    fn rejects_unknown_argument() {
        let err = Config::parse(&args(&["--comparative", "--frobnicate"])).unwrap_err();
        assert!(err.to_string().contains("--frobnicate"));
    }

    #[test]
    fn reports_missing_keys() {
        let err = Config::parse(&args(&["--competition"])).unwrap_err();
        let text = err.to_string();
        assert!(text.contains("game_maps_folder"));
        assert!(text.contains("game_manager"));
        assert!(text.contains("algorithms_folder"));
    }

    #[test]
    fn rejects_plugin_folder_without_libraries() {
        let dir = tempfile::tempdir().unwrap();
        let map = dir.path().join("battle.txt");
        drop(File::create(&map).unwrap());
        let gms = dir.path().join("gms");
        std::fs::create_dir(&gms).unwrap();
        let a1 = plugin_file(dir.path(), "alpha");
        let a2 = plugin_file(dir.path(), "beta");

        let err = Config::parse(&args(&[
            "--comparative",
            &format!("game_map={}", map.display()),
            &format!("game_managers_folder={}", gms.display()),
            &format!("algorithm1={}", a1.display()),
            &format!("algorithm2={}", a2.display()),
        ]))
        .unwrap_err();
        assert!(err.to_string().contains("game_managers_folder"));
    }
}
