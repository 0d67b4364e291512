use std::path::PathBuf;

use clap::{Parser, ValueEnum};

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum StorageBackend {
    Postgres,
    Memory,
}

#[derive(Parser, Clone, Debug)]
pub struct Config {
    /// `production` disables the reset endpoint
    #[clap(env, long, default_value = "development")]
    pub environment: String,

    #[clap(env, long, default_value_t = 5020)]
    pub port: u16,

    /// Comma separated list of allowed CORS origins
    #[clap(env, long, default_value = "http://localhost:5173")]
    pub origin_urls: String,

    #[clap(env, long, value_enum, default_value_t = StorageBackend::Postgres)]
    pub storage: StorageBackend,

    #[clap(env, long)]
    pub database_url: Option<String>,

    #[clap(env, long, default_value_t = default_pool_size())]
    pub database_pool_size: u32,

    /// Directory holding items.json and plateaus.json
    #[clap(env, long, default_value = "data")]
    pub fixtures_dir: PathBuf,
}

impl Config {
    pub fn is_production(&self) -> bool {
        self.environment.eq_ignore_ascii_case("production")
    }
}

fn default_pool_size() -> u32 {
    (num_cpus::get() * 2) as u32
}
