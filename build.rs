use std::env;
use std::fs;
use std::path::PathBuf;

fn main() {
    let out = PathBuf::from(env::var("OUT_DIR").expect("OUT_DIR"));
    let mut features: Vec<String> = env::vars()
        .filter_map(|(k, _)| k.strip_prefix("CARGO_FEATURE_").map(str::to_owned))
        .filter(|name| name != "DEFAULT")
        .map(|name| name.to_ascii_lowercase().replace('_', "-"))
        .collect();
    features.sort();
    let list = features.iter().map(|s| format!("\"{s}\"")).collect::<Vec<_>>().join(", ");
    let content = format!("pub static COMPILED_FEATURES: &[&str] = &[{list}];\n");
    fs::write(out.join("compiled_features.rs"), content).expect("write compiled_features.rs");
    println!("cargo:rerun-if-changed=build.rs");
}
