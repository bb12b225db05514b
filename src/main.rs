//! Dockfleet - 多租户 docker 主机控制面
//!
//! Usage:
//! - Normal mode: `dockfleet`
//! - With custom port: `dockfleet --port 19400`

use dockfleet::RuntimeConfig;

/// 解析命令行参数
fn parse_args() -> RuntimeConfig {
    let args: Vec<String> = std::env::args().collect();
    let mut config = RuntimeConfig::default();

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--port" if i + 1 < args.len() => {
                config.port_override = args[i + 1].parse().ok();
                i += 2;
            }
            "--help" | "-h" => {
                print_help();
                std::process::exit(0);
            }
            _ => {
                i += 1;
            }
        }
    }

    config
}

fn print_help() {
    println!("Dockfleet - 多租户 docker 主机控制面");
    println!();
    println!("USAGE:");
    println!("    dockfleet [OPTIONS]");
    println!();
    println!("OPTIONS:");
    println!("    --port <PORT>    Override the listening port");
    println!("    -h, --help       Print help information");
    println!();
    println!("EXAMPLES:");
    println!("    dockfleet                 # Normal mode");
    println!("    dockfleet --port 19400    # Custom port");
}

fn main() {
    let config = parse_args();

    let rt = tokio::runtime::Runtime::new().expect("Failed to create runtime");
    if let Err(e) = rt.block_on(dockfleet::init_and_run(config)) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
