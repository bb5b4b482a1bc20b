use std::process::Command;

fn git(args: &[&str]) -> Option<String> {
    let output = Command::new("git").args(args).output().ok()?;
    if !output.status.success() {
        return None;
    }
    String::from_utf8(output.stdout)
        .ok()
        .map(|text| text.trim().to_string())
}

fn main() {
    let version = env!("CARGO_PKG_VERSION");
    let profile = std::env::var("PROFILE").unwrap_or_default();

    // Release builds show the plain version, dev builds append the commit
    let version_str = if profile == "release" {
        version.to_string()
    } else {
        match git(&["rev-parse", "--short", "HEAD"]) {
            Some(hash) => {
                let dirty = git(&["status", "--porcelain"]).is_some_and(|s| !s.is_empty());
                format!("{}+{}{}", version, hash, if dirty { "-dirty" } else { "" })
            }
            None => version.to_string(),
        }
    };

    println!("cargo:rerun-if-changed=.git/HEAD");
    println!("cargo:rustc-env=VERSION_STRING={}", version_str);
}
