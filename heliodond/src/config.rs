use heliodon_api::{provider::ProviderConfig, solar};
use serde_derive::Deserialize;
use std::env;
use toml::{self, value};
use tracing::Level;

fn def_log_level() -> String {
    String::from("warn")
}

/// How the globe is drawn. `flat` is the plain textured globe with no
/// lighting pipeline; the other two drive the sun-position pipeline.

#[derive(Deserialize, Debug, Clone, Copy, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum Style {
    Flat,
    Realistic,
    Stylized,
}

impl Style {
    /// The lighting mode behind a style, if the style has one.

    pub fn mode(&self) -> Option<solar::Mode> {
        match self {
            Style::Flat => None,
            Style::Realistic => Some(solar::Mode::Realistic),
            Style::Stylized => Some(solar::Mode::Stylized),
        }
    }
}

#[derive(Deserialize)]
pub struct LocationConfig {
    #[serde(default = "LocationConfig::def_provider")]
    pub provider: String,
    #[serde(default)]
    pub cfg: ProviderConfig,
}

impl LocationConfig {
    fn def_provider() -> String {
        String::from("geoip")
    }
}

impl Default for LocationConfig {
    fn default() -> Self {
        LocationConfig {
            provider: LocationConfig::def_provider(),
            cfg: ProviderConfig::new(),
        }
    }
}

#[derive(Deserialize)]
pub struct GlobeConfig {
    #[serde(default = "GlobeConfig::def_style", alias = "mode")]
    pub style: Style,
    #[serde(default = "GlobeConfig::def_textures")]
    pub textures: String,
    #[serde(default = "GlobeConfig::def_resolution")]
    pub resolution: String,
}

impl GlobeConfig {
    fn def_style() -> Style {
        Style::Realistic
    }

    fn def_textures() -> String {
        String::from("textures")
    }

    fn def_resolution() -> String {
        String::from("2k")
    }
}

impl Default for GlobeConfig {
    fn default() -> Self {
        GlobeConfig {
            style: GlobeConfig::def_style(),
            textures: GlobeConfig::def_textures(),
            resolution: GlobeConfig::def_resolution(),
        }
    }
}

#[derive(Deserialize)]
pub struct SceneConfig {
    #[serde(default = "SceneConfig::def_boundaries")]
    pub boundaries: bool,
    pub boundaries_url: Option<String>,
}

impl SceneConfig {
    fn def_boundaries() -> bool {
        true
    }
}

impl Default for SceneConfig {
    fn default() -> Self {
        SceneConfig {
            boundaries: SceneConfig::def_boundaries(),
            boundaries_url: None,
        }
    }
}

#[derive(Deserialize)]
pub struct Config {
    #[serde(default = "def_log_level")]
    log_level: String,
    #[serde(default)]
    pub location: LocationConfig,
    #[serde(default)]
    pub globe: GlobeConfig,
    #[serde(default)]
    pub scene: SceneConfig,
}

impl Config {
    pub fn get_log_level(&self) -> Level {
        match self.log_level.as_str() {
            "info" => Level::INFO,
            "debug" => Level::DEBUG,
            "trace" => Level::TRACE,
            _ => Level::WARN,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            log_level: def_log_level(),
            location: LocationConfig::default(),
            globe: GlobeConfig::default(),
            scene: SceneConfig::default(),
        }
    }
}

struct Opts {
    cfg_file: Option<String>,
    log_level: Option<Level>,
    print_cfg: bool,
}

fn from_cmdline() -> Opts {
    use clap::{Arg, ArgAction, Command};

    let matches = Command::new("heliodond")
        .version(clap::crate_version!())
        .about("Sun-position daemon for an interactive globe.")
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .help("Specifies the configuration file")
                .num_args(1),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .action(ArgAction::Count)
                .help(
                    "Sets verbosity of log; can be used more than once",
                ),
        )
        .arg(
            Arg::new("print_cfg")
                .long("print-config")
                .action(ArgAction::SetTrue)
                .help("Displays the configuration and exits"),
        )
        .get_matches();

    // The number of '-v' options determines the log level.

    let log_level = match matches.get_count("verbose") {
        0 => None,
        1 => Some(Level::INFO),
        2 => Some(Level::DEBUG),
        _ => Some(Level::TRACE),
    };

    Opts {
        cfg_file: matches.get_one::<String>("config").cloned(),
        log_level,
        print_cfg: matches.get_flag("print_cfg"),
    }
}

fn parse_config(contents: &str) -> Option<Config> {
    match toml::from_str(contents) {
        Ok(cfg) => Some(cfg),
        Err(e) => {
            eprintln!("ERROR: {}", &e);
            None
        }
    }
}

async fn from_file(path: &str) -> Option<Config> {
    use tokio::fs;

    if let Ok(contents) = fs::read(path).await {
        let contents = String::from_utf8_lossy(&contents);

        parse_config(&contents)
    } else {
        None
    }
}

// Searches the standard locations for a configuration file. A file
// named on the command line takes precedence and, unlike the search
// path, is an error when missing.

async fn find_cfg(cfg_file: Option<&str>) -> Option<Config> {
    if let Some(path) = cfg_file {
        let cfg = from_file(path).await;

        if cfg.is_none() {
            eprintln!("ERROR: couldn't read {}", path);
        }
        return cfg;
    }

    const CFG_FILE: &str = "heliodon.toml";

    if let Some(cfg) = from_file(CFG_FILE).await {
        return Some(cfg);
    }

    if let Ok(home) = env::var("HOME") {
        let path = format!("{}/.{}", home, CFG_FILE);

        if let Some(cfg) = from_file(&path).await {
            return Some(cfg);
        }
    }

    let path = format!("/usr/local/etc/{}", CFG_FILE);

    if let Some(cfg) = from_file(&path).await {
        return Some(cfg);
    }

    let path = format!("/etc/{}", CFG_FILE);

    if let Some(cfg) = from_file(&path).await {
        return Some(cfg);
    }

    Some(Config::default())
}

fn dump_config(cfg: &Config) {
    println!("Configuration:");
    println!("    log level: {}\n", cfg.get_log_level());
    println!("Location:");
    println!("    provider: {}", &cfg.location.provider);
    println!(
        "    parameters: {}\n",
        value::Value::Table(cfg.location.cfg.clone())
    );
    println!("Globe:");
    println!("    style: {:?}", cfg.globe.style);
    println!("    textures: {}", &cfg.globe.textures);
    println!("    resolution: {}\n", &cfg.globe.resolution);
    println!("Scene:");
    println!("    country boundaries: {}", cfg.scene.boundaries);
    if let Some(url) = &cfg.scene.boundaries_url {
        println!("    boundaries URL: {}", url);
    }
}

pub async fn get() -> Option<Config> {
    let opts = from_cmdline();
    let mut cfg = find_cfg(opts.cfg_file.as_deref()).await?;

    // Command line verbosity overrides the config file.

    if let Some(level) = opts.log_level {
        cfg.log_level = level.to_string().to_lowercase();
    }

    if opts.print_cfg {
        dump_config(&cfg);
        None
    } else {
        Some(cfg)
    }
}
