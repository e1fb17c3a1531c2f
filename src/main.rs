use std::io::{self, BufRead};
use std::rc::Rc;

use shell_bridge::config::{init_logging, BridgeConfig};
use shell_bridge::{Bridge, MiniShell};

fn main() {
    let config = match BridgeConfig::load_or_default() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("shell-bridge: {}", e);
            std::process::exit(2);
        }
    };
    init_logging(&config.logging);

    let shell = Rc::new(MiniShell::new(config.host.clone()));
    shell.import_environment();
    let _bridge = Bridge::attach(&shell, config);

    let status = match std::env::args().nth(1) {
        Some(path) => match std::fs::read_to_string(&path) {
            Ok(source) => shell.run_script(&source),
            Err(e) => {
                eprintln!("shell-bridge: {}: {}", path, e);
                127
            }
        },
        None => {
            for line in io::stdin().lock().lines() {
                match line {
                    Ok(line) => {
                        shell.run_line(&line);
                    }
                    Err(e) => {
                        eprintln!("shell-bridge: {}", e);
                        break;
                    }
                }
            }
            shell.last_status()
        }
    };

    std::process::exit(status);
}
