use std::{env, fs, path::PathBuf};

fn main() {
	let manifest_dir = PathBuf::from(env::var_os("CARGO_MANIFEST_DIR").unwrap());

	// secrets.rs is the user's private copy of secrets_template.rs
	println!("cargo::rustc-check-cfg=cfg(has_user_secrets)");
	println!("cargo::rerun-if-changed=secrets.rs");
	println!("cargo::rerun-if-changed=secrets_template.rs");
	if manifest_dir.join("secrets.rs").exists() {
		println!("cargo::rustc-cfg=has_user_secrets");
	} else {
		println!("cargo::warning=secrets.rs not found, building with secrets_template.rs");
	}

	if env::var_os("CARGO_FEATURE_FIRMWARE").is_some() {
		let out = PathBuf::from(env::var_os("OUT_DIR").unwrap());
		fs::write(out.join("memory.x"), include_bytes!("memory.x")).unwrap();
		println!("cargo::rustc-link-search={}", out.display());
		println!("cargo::rerun-if-changed=memory.x");

		println!("cargo::rustc-link-arg-bins=--nmagic");
		println!("cargo::rustc-link-arg-bins=-Tlink.x");
		println!("cargo::rustc-link-arg-bins=-Tdefmt.x");
	}
}
