use greenergy::config::ConfigLoader;
use std::{
    env, fs,
    path::PathBuf,
    sync::{Mutex, MutexGuard, OnceLock},
};
use tempfile::TempDir;

const VARS: [&str; 8] = [
    "GREENERGY_PROFILE",
    "GREENERGY_API_BIND_ADDR",
    "GREENERGY_LOG_LEVEL",
    "GREENERGY_LOG_FORMAT",
    "GREENERGY_JWT_SECRET",
    "GREENERGY_API_KEY_HASHES",
    "GREENERGY_DB_MAX_CONNECTIONS",
    "GREENERGY_SEED_DIR",
];

const KEY_HASH: &str = "9f86d081884c7d659a2feaa0c55ad015a3bf4f1b2b0b822cd15d6c15b0f00a08";

fn env_lock() -> &'static Mutex<()> {
    static LOCK: OnceLock<Mutex<()>> = OnceLock::new();
    LOCK.get_or_init(|| Mutex::new(()))
}

fn env_guard() -> MutexGuard<'static, ()> {
    env_lock()
        .lock()
        .unwrap_or_else(|poison| poison.into_inner())
}

fn clear_env() {
    unsafe {
        for var in VARS {
            env::remove_var(var);
        }
    }
}

fn write_env_file(dir: &TempDir, name: &str, contents: &str) {
    let path = dir.path().join(name);
    fs::write(path, contents).unwrap();
}

#[test]
fn loads_defaults_when_no_env_present() {
    let _guard = env_guard();
    clear_env();

    let temp_dir = TempDir::new().unwrap();
    let loader = ConfigLoader::with_base_dir(PathBuf::from(temp_dir.path()));
    let cfg = loader.load().expect("config loads with defaults");

    assert_eq!(cfg.profile, "local");
    assert_eq!(cfg.api_bind_addr, "0.0.0.0:3333");
    assert_eq!(cfg.log_level, "info");
    assert_eq!(cfg.log_format, "json");
    assert_eq!(cfg.api_key_header, "x-api-key");
    assert_eq!(cfg.seed_dir, PathBuf::from("assets/unavailability"));
    assert!(!cfg.auth_configured());
    cfg.bind_addr().expect("default bind addr parses");
    clear_env();
}

#[test]
fn layered_env_files_apply_in_order() {
    let _guard = env_guard();
    clear_env();

    let temp_dir = TempDir::new().unwrap();
    write_env_file(&temp_dir, ".env", "GREENERGY_API_BIND_ADDR=127.0.0.1:3000\n");
    write_env_file(
        &temp_dir,
        ".env.test",
        "GREENERGY_API_BIND_ADDR=192.168.0.10:5000\n",
    );
    write_env_file(
        &temp_dir,
        ".env.test.local",
        "GREENERGY_API_BIND_ADDR=10.0.0.5:6000\n",
    );

    // Select profile via .env.local before profile-specific files load.
    write_env_file(
        &temp_dir,
        ".env.local",
        "GREENERGY_PROFILE=test\nGREENERGY_API_BIND_ADDR=127.0.0.1:4000\n",
    );

    let loader = ConfigLoader::with_base_dir(PathBuf::from(temp_dir.path()));
    let cfg = loader.load().expect("config loads with layered env files");

    assert_eq!(cfg.profile, "test");
    assert_eq!(cfg.api_bind_addr, "10.0.0.5:6000");
    clear_env();
}

#[test]
fn os_environment_has_highest_precedence() {
    let _guard = env_guard();
    clear_env();

    let temp_dir = TempDir::new().unwrap();
    write_env_file(
        &temp_dir,
        ".env",
        "GREENERGY_API_BIND_ADDR=127.0.0.1:3000\nGREENERGY_SEED_DIR=/srv/outages\n",
    );

    unsafe {
        env::set_var("GREENERGY_API_BIND_ADDR", "0.0.0.0:9090");
    }

    let loader = ConfigLoader::with_base_dir(PathBuf::from(temp_dir.path()));
    let cfg = loader.load().expect("config loads with env override");
    assert_eq!(cfg.api_bind_addr, "0.0.0.0:9090");
    assert_eq!(cfg.seed_dir, PathBuf::from("/srv/outages"));

    clear_env();
}

#[test]
fn invalid_bind_addr_returns_error() {
    let _guard = env_guard();
    clear_env();

    unsafe {
        env::set_var("GREENERGY_API_BIND_ADDR", "not-an-addr");
    }
    let temp_dir = TempDir::new().unwrap();
    let loader = ConfigLoader::with_base_dir(PathBuf::from(temp_dir.path()));
    let err = loader.load().expect_err("invalid bind addr should fail");
    assert!(format!("{}", err).contains("invalid api bind address"));

    clear_env();
}

#[test]
fn production_profile_requires_authentication() {
    let _guard = env_guard();
    clear_env();

    unsafe {
        env::set_var("GREENERGY_PROFILE", "prod");
    }
    let temp_dir = TempDir::new().unwrap();
    let loader = ConfigLoader::with_base_dir(PathBuf::from(temp_dir.path()));
    let err = loader.load().expect_err("prod without auth should fail");
    assert!(format!("{}", err).contains("requires authentication"));

    unsafe {
        env::set_var("GREENERGY_API_KEY_HASHES", format!(" {KEY_HASH} ,"));
    }
    let cfg = loader.load().expect("prod with an api key hash loads");
    assert_eq!(cfg.api_key_hashes, vec![KEY_HASH.to_string()]);

    clear_env();
}

#[test]
fn malformed_numeric_value_names_the_key() {
    let _guard = env_guard();
    clear_env();

    unsafe {
        env::set_var("GREENERGY_DB_MAX_CONNECTIONS", "lots");
    }
    let temp_dir = TempDir::new().unwrap();
    let loader = ConfigLoader::with_base_dir(PathBuf::from(temp_dir.path()));
    let err = loader.load().expect_err("non-numeric pool size should fail");
    assert!(format!("{}", err).contains("GREENERGY_DB_MAX_CONNECTIONS"));

    clear_env();
}
