use std::env;
use std::fs;
use std::path::Path;

fn main() {
    // Create config template if it doesn't exist
    let out_dir = env::var("OUT_DIR").unwrap_or_else(|_| "./".to_string());
    let template_path = Path::new(&out_dir).join("../../../config.template.toml");

    let template = r#"# vdk-mpegts Configuration Template
# Copy this file to 'config.toml' or 'vdk_mpegts.toml' and adjust the values

check_crc = false
continuity_check = true
parse_picture_type = true
pmt_pid = 4095
nominal_bitrate = 4000000
"#;

    let _ = fs::write(template_path, template);
    println!("cargo:rerun-if-changed=build.rs");
}
