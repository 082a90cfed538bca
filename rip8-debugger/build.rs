use std::{env, process::Command};

fn main() {
    println!("cargo:rerun-if-env-changed=RIP8_BUILD_GIT_TAG");
    println!("cargo:rerun-if-env-changed=RIP8_BUILD_GIT_COMMIT");
    println!("cargo:rerun-if-env-changed=RIP8_BUILD_GIT_DIRTY");

    let git_tag = env::var("RIP8_BUILD_GIT_TAG").unwrap_or_else(|_| {
        git_output(&["describe", "--tags", "--exact-match"])
            .unwrap_or_else(|| "untagged".to_string())
    });
    let git_commit = env::var("RIP8_BUILD_GIT_COMMIT").unwrap_or_else(|_| {
        git_output(&["rev-parse", "--short=12", "HEAD"]).unwrap_or_else(|| "unknown".to_string())
    });
    let git_dirty = env::var("RIP8_BUILD_GIT_DIRTY").unwrap_or_else(|_| {
        let dirty = git_output(&["status", "--porcelain", "--untracked-files=no"])
            .is_some_and(|status| !status.is_empty());
        dirty.to_string()
    });

    for (key, value) in [
        ("RIP8_BUILD_GIT_TAG", git_tag),
        ("RIP8_BUILD_GIT_COMMIT", git_commit),
        ("RIP8_BUILD_GIT_DIRTY", git_dirty),
    ] {
        println!("cargo:rustc-env={key}={value}");
    }
}

fn git_output(args: &[&str]) -> Option<String> {
    let output = Command::new("git").args(args).output().ok()?;
    if !output.status.success() {
        return None;
    }
    let text = String::from_utf8(output.stdout).ok()?;
    Some(text.trim().to_string())
}
