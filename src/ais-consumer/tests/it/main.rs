#![deny(warnings)]
#![deny(rust_2018_idioms)]

use ais_consumer::settings::{Environment, Settings};
use config::{Config, File};

pub mod consumer;
pub mod helper;
pub mod startup;

fn settings(file: &str, environment: &str) -> Settings {
    Config::builder()
        .add_source(File::with_name(file).required(true))
        .set_override("environment", environment)
        .unwrap()
        .build()
        .unwrap()
        .try_deserialize::<Settings>()
        .unwrap()
}

#[test]
fn test_local_settings_are_valid() {
    let settings = settings("config/local.yml", "Local");
    assert_eq!(settings.tracker.geofences.len(), 1);
    assert!(settings.api_address.is_some());
}

#[test]
fn test_development_settings_are_valid() {
    settings("config/development.yml", "Development");
}

#[test]
fn test_production_settings_are_valid() {
    let settings = settings("config/production.yml", "Production");
    assert_eq!(settings.environment, Environment::Production);
    assert!(settings.api_address.is_none());
}

#[test]
fn test_every_environment_has_a_settings_file() {
    for environment in [
        Environment::Local,
        Environment::Development,
        Environment::Production,
        Environment::Test,
    ] {
        let file = format!("config/{}.yml", environment.as_ref().to_lowercase());
        assert_eq!(settings(&file, environment.as_ref()).environment, environment);
    }
}

#[test]
fn test_test_settings_are_valid() {
    let settings = settings("config/test.yml", "Test");
    assert_eq!(settings.tracker.tick_interval, std::time::Duration::from_secs(2));
    assert!(settings.api_address.is_none());
}
