// tests/common.rs

use std::fs;
use std::path::Path;
use std::process::Command;

// Binary command with the completion environment cleared, so a developer's
// own key or .env never leaks into a test run.
#[allow(dead_code)] // Not every integration test uses every helper.
pub fn autocss_cmd() -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("autocss"));
    for var in [
        "OPENAI_API_KEY",
        "AUTOCSS_API_BASE",
        "AUTOCSS_MODEL",
        "AUTOCSS_DATA_DIR",
        "AUTOCSS_MAX_UPLOAD_SIZE",
        "GITHUB_TOKEN",
    ] {
        cmd.env_remove(var);
    }
    cmd
}

#[allow(dead_code)]
pub fn create_file(dir: &Path, relative_path: &str, content: &str) -> std::io::Result<()> {
    let file_path = dir.join(relative_path);
    if let Some(parent) = file_path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(file_path, content)
}

/// Writes a two-page site under `dir/site` and returns its path.
#[allow(dead_code)]
pub fn create_site(dir: &Path) -> std::io::Result<std::path::PathBuf> {
    let root = dir.join("site");
    create_file(
        &root,
        "index.html",
        r#"<html><head><title>Home</title></head><body><header id="top" class="hero banner"></header></body></html>"#,
    )?;
    create_file(
        &root,
        "pages/about.html",
        r#"<html><body><section class="card"></section></body></html>"#,
    )?;
    create_file(&root, "css/base.css", "body { margin: 0; }")?;
    create_file(&root, "js/app.js", "console.log('hi');")?;
    Ok(root)
}
