fn main() {
    println!(
        "cargo:rustc-env=STATIC_BUILD_DATE={}",
        chrono::Utc::now().to_rfc3339()
    );
}
