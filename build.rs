use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

fn main() {
    println!("cargo:rerun-if-changed=build.rs");
    println!("cargo:rerun-if-changed=assets/Dockerfile");
    println!("cargo:rerun-if-changed=assets/dockerignore");

    // Build date (UTC RFC 3339). Fallback to unix:<secs> if formatting fails.
    let now = OffsetDateTime::now_utc();
    let build_date = now
        .format(&Rfc3339)
        .unwrap_or_else(|_| format!("unix:{}", now.unix_timestamp()));
    println!("cargo:rustc-env=DEVCONTAINER_BUILD_DATE={build_date}");

    let target = std::env::var("TARGET").unwrap_or_else(|_| "unknown".to_string());
    println!("cargo:rustc-env=DEVCONTAINER_BUILD_TARGET={target}");

    let profile = std::env::var("PROFILE").unwrap_or_else(|_| "unknown".to_string());
    println!("cargo:rustc-env=DEVCONTAINER_BUILD_PROFILE={profile}");

    // rustc version (best-effort)
    let rustc_ver = rustc_version::version()
        .map(|v| v.to_string())
        .unwrap_or_else(|_| "unknown".to_string());
    println!("cargo:rustc-env=DEVCONTAINER_BUILD_RUSTC={rustc_ver}");
}
