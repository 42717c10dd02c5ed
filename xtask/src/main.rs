// Academy Gateway - Build Task Runner
// Unified build system using cargo xtask pattern

use anyhow::{Context, Result};
use xshell::{cmd, Shell};

const BINARY: &str = "academy-gateway";

fn main() -> Result<()> {
    let sh = Shell::new()?;
    let args: Vec<_> = std::env::args().skip(1).collect();

    match args.first().map(|s| s.as_str()) {
        Some("build") => {
            let release = args.contains(&"--release".to_string());
            build(&sh, release)
        }
        Some("test") => test(&sh),
        Some("format") => {
            let check = args.contains(&"--check".to_string());
            format(&sh, check)
        }
        Some("clippy") => clippy(&sh),
        Some("run") => run(&sh, &args[1..]),
        Some("clean") => clean(&sh),
        Some("ci") => ci(&sh),
        Some("dist") => dist(&sh),
        _ => {
            print_help();
            Ok(())
        }
    }
}

fn print_help() {
    println!("Academy Gateway - Build Commands:");
    println!();
    println!("Usage: cargo xtask <COMMAND> [OPTIONS]");
    println!();
    println!("Commands:");
    println!("  build [--release]   Build the gateway");
    println!("  test                Run all tests");
    println!("  format [--check]    Format code (check mode doesn't modify)");
    println!("  clippy              Run clippy checks");
    println!("  run [ARGS...]       Run the gateway (ARGS go to the binary)");
    println!("  clean               Clean build artifacts");
    println!("  ci                  Run all CI checks (format + clippy + build + test)");
    println!("  dist                Create distribution package (tar.gz)");
    println!();
    println!("Examples:");
    println!("  cargo xtask build --release");
    println!("  cargo xtask run -- --port 3001");
    println!("  cargo xtask format --check");
}

fn build(sh: &Shell, release: bool) -> Result<()> {
    println!("🔨 Building {}{}...", BINARY, if release { " (release)" } else { "" });

    let _dir = sh.push_dir(project_root());
    if release {
        cmd!(sh, "cargo build --release -p {BINARY}")
            .run()
            .context("Failed to build gateway in release mode")?;
    } else {
        cmd!(sh, "cargo build -p {BINARY}")
            .run()
            .context("Failed to build gateway")?;
    }

    println!("✅ Build complete");
    Ok(())
}

fn test(sh: &Shell) -> Result<()> {
    println!("🧪 Running tests...");

    let _dir = sh.push_dir(project_root());
    cmd!(sh, "cargo test --workspace")
        .run()
        .context("Tests failed")?;

    println!("✅ All tests passed!");
    Ok(())
}

fn format(sh: &Shell, check: bool) -> Result<()> {
    let _dir = sh.push_dir(project_root());

    if check {
        cmd!(sh, "cargo fmt --all -- --check")
            .run()
            .context("Rust code is not formatted")?;
        println!("✅ Rust code is properly formatted");
    } else {
        cmd!(sh, "cargo fmt --all")
            .run()
            .context("Failed to format Rust code")?;
        println!("✅ Rust code formatted");
    }

    Ok(())
}

fn clippy(sh: &Shell) -> Result<()> {
    let _dir = sh.push_dir(project_root());

    cmd!(sh, "cargo clippy --workspace --all-targets -- --deny warnings --allow clippy::uninlined-format-args")
        .run()
        .context("Clippy checks failed")?;

    Ok(())
}

fn run(sh: &Shell, args: &[String]) -> Result<()> {
    println!("🚀 Running {}...", BINARY);

    let _dir = sh.push_dir(project_root());
    let args = args.iter().skip_while(|a| a.as_str() == "--");
    cmd!(sh, "cargo run -p {BINARY} --")
        .args(args)
        .run()
        .context("Failed to run gateway")?;

    Ok(())
}

fn clean(sh: &Shell) -> Result<()> {
    println!("🧹 Cleaning build artifacts...");

    let project = project_root();
    let _dir = sh.push_dir(&project);
    cmd!(sh, "cargo clean").run()?;

    let build_dir = project.join("build");
    if build_dir.exists() {
        sh.remove_path(&build_dir)?;
    }

    println!("✅ Clean complete!");
    Ok(())
}

/// format + clippy + build + test
fn ci(sh: &Shell) -> Result<()> {
    println!("🔄 Running CI pipeline...");

    println!("📝 [1/4] Checking code format...");
    format(sh, true)?;

    println!("🔍 [2/4] Running clippy checks...");
    clippy(sh)?;

    println!("🔨 [3/4] Building project...");
    build(sh, true)?;

    println!("🧪 [4/4] Running tests...");
    test(sh)?;

    println!("🎉 CI pipeline completed successfully!");
    Ok(())
}

/// Release binary, default config and static assets as a tarball
fn dist(sh: &Shell) -> Result<()> {
    build(sh, true)?;

    let project = project_root();
    let dist_dir = project.join("build/dist");
    for sub in ["bin", "conf", "logs", "web"] {
        sh.create_dir(dist_dir.join(sub))?;
    }

    let binary = project.join("target/release").join(BINARY);
    sh.copy_file(&binary, dist_dir.join("bin"))?;

    let web_root = project.join("web");
    if web_root.exists() {
        cmd!(sh, "cp -r {web_root}/. {dist_dir}/web/").run()?;
    }

    write_default_config(&dist_dir)?;

    let timestamp = chrono::Local::now().format("%Y%m%d_%H%M%S");
    let package_name = format!("{}-{}.tar.gz", BINARY, timestamp);

    let _dir = sh.push_dir(&dist_dir);
    cmd!(sh, "tar czf {package_name} bin conf logs web")
        .run()
        .context("Failed to create tarball")?;

    println!("✅ Distribution package created: {}", dist_dir.join(&package_name).display());
    Ok(())
}

fn write_default_config(dist_dir: &std::path::Path) -> Result<()> {
    let config_content = r#"[server]
host = "0.0.0.0"
port = 3000

[backend]
base_url = "http://127.0.0.1:8000/api"
timeout_secs = "15s"

[cookies]
# at least 64 bytes; override with APP_COOKIE_SECRET
secret = "change-me-change-me-change-me-change-me-change-me-change-me-change-me"
secure = true

[locale]
default = "en"

[verification]
max_attempts = 3
attempt_timeout_secs = "10s"
backoff_ms = 1000

[cache]
list_ttl_secs = "30s"

[logging]
level = "info,academy_gateway=debug"
file = "logs/academy-gateway.log"

[static_config]
enabled = true
web_root = "web"
"#;

    std::fs::write(dist_dir.join("conf/config.toml"), config_content)
        .context("Failed to create config file")?;
    Ok(())
}

fn project_root() -> std::path::PathBuf {
    std::path::Path::new(&env!("CARGO_MANIFEST_DIR"))
        .ancestors()
        .nth(1)
        .unwrap()
        .to_path_buf()
}
