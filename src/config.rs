// Configuration loading, validation, and default generation
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Deserialize, Clone, Default)]
#[serde(default)]
pub struct Config {
    pub harness: Harness,
    pub target: Target,
    pub timing: Timing,
    pub instrumentation: Instrumentation,
}

#[derive(Deserialize, Clone)]
#[serde(default)]
pub struct Harness {
    pub base_port: u16,
    pub artifacts_dir: String,
    pub log_level: String,
    pub logging: bool,
}

#[derive(Deserialize, Clone)]
#[serde(default)]
pub struct Target {
    pub executable: String,
    pub filter_file: String,
    pub compile: bool,
    pub compiler: String,
    pub source_dir: String,
    pub compiler_flags: Vec<String>,
    pub link_libs: Vec<String>,
    /// `host[:port]` the binary reference is fetched from directly.
    pub binary_origin: String,
}

/// All values in milliseconds.
#[derive(Deserialize, Clone)]
#[serde(default)]
pub struct Timing {
    pub warm_up: u64,
    pub socket_timeout: u64,
    pub deadlock_timeout: u64,
    pub reap_timeout: u64,
    pub keep_alive_reap_timeout: u64,
    pub instrumented_reap_timeout: u64,
    pub usage_timeout: u64,
    pub fragment_delay: u64,
}

#[derive(Deserialize, Clone)]
#[serde(default)]
pub struct Instrumentation {
    pub tool: String,
    pub args: Vec<String>,
    pub log_file: String,
}

impl Default for Harness {
    fn default() -> Self {
        Harness {
            base_port: 3000,
            artifacts_dir: ".".to_string(),
            log_level: "info".to_string(),
            logging: true,
        }
    }
}

impl Default for Target {
    fn default() -> Self {
        Target {
            executable: "proxyServer".to_string(),
            filter_file: "filter.txt".to_string(),
            compile: true,
            compiler: "gcc".to_string(),
            source_dir: ".".to_string(),
            compiler_flags: vec!["-Wall".to_string()],
            link_libs: vec!["-lpthread".to_string()],
            binary_origin: "webaward.org:80".to_string(),
        }
    }
}

impl Default for Timing {
    fn default() -> Self {
        Timing {
            warm_up: 3_000,
            socket_timeout: 10_000,
            deadlock_timeout: 20_000,
            reap_timeout: 3_000,
            keep_alive_reap_timeout: 10_000,
            instrumented_reap_timeout: 5_000,
            usage_timeout: 5_000,
            fragment_delay: 500,
        }
    }
}

impl Default for Instrumentation {
    fn default() -> Self {
        Instrumentation {
            tool: "valgrind".to_string(),
            args: [
                "--leak-check=full",
                "--tool=memcheck",
                "--show-leak-kinds=all",
                "--track-origins=yes",
                "--verbose",
                "--error-exitcode=1",
                "-v",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            log_file: "valgrind-out.txt".to_string(),
        }
    }
}

impl Timing {
    pub fn socket(&self) -> Duration { Duration::from_millis(self.socket_timeout) }
    pub fn deadlock(&self) -> Duration { Duration::from_millis(self.deadlock_timeout) }
    pub fn reap(&self) -> Duration { Duration::from_millis(self.reap_timeout) }
    pub fn keep_alive_reap(&self) -> Duration { Duration::from_millis(self.keep_alive_reap_timeout) }
    pub fn instrumented_reap(&self) -> Duration { Duration::from_millis(self.instrumented_reap_timeout) }
    pub fn usage(&self) -> Duration { Duration::from_millis(self.usage_timeout) }
    pub fn warm_up(&self) -> Duration { Duration::from_millis(self.warm_up) }
    pub fn fragment_delay(&self) -> Duration { Duration::from_millis(self.fragment_delay) }
}

impl Config {
    pub fn artifact_path(&self, name: &str) -> PathBuf {
        Path::new(&self.harness.artifacts_dir).join(name)
    }

    /// Path the target is launched from. Bare names are resolved against the
    /// working directory the way `./proxyServer` would be.
    pub fn executable_path(&self) -> PathBuf {
        let p = Path::new(&self.target.executable);
        if p.components().count() == 1 {
            Path::new(".").join(p)
        } else {
            p.to_path_buf()
        }
    }

    pub fn validate(&mut self) -> bool {
        let mut valid = true;

        if self.target.executable.trim().is_empty() {
            crate::log::error("target.executable is empty");
            valid = false;
        }
        if self.target.compile && self.target.compiler.trim().is_empty() {
            crate::log::error("target.compile is set but target.compiler is empty");
            valid = false;
        }
        if self.target.binary_origin.trim().is_empty() {
            crate::log::warn("target.binary_origin is empty, using webaward.org:80");
            self.target.binary_origin = "webaward.org:80".to_string();
        }
        if self.instrumentation.tool.trim().is_empty() {
            crate::log::error("instrumentation.tool is empty");
            valid = false;
        }
        if self.instrumentation.log_file.trim().is_empty() {
            crate::log::warn("instrumentation.log_file is empty, using valgrind-out.txt");
            self.instrumentation.log_file = "valgrind-out.txt".to_string();
        }
        if self.harness.base_port == 0 {
            crate::log::warn("base_port is 0, using 3000");
            self.harness.base_port = 3000;
        }
        if self.harness.base_port > u16::MAX - 64 {
            crate::log::error(&format!("base_port {} leaves no room for one port per scenario", self.harness.base_port));
            valid = false;
        }
        if !crate::log::is_known_level(&self.harness.log_level) {
            crate::log::warn(&format!("unknown log_level '{}', using info", self.harness.log_level));
            self.harness.log_level = "info".to_string();
        }

        let t = &mut self.timing;
        let d = Timing::default();
        for (name, v, fallback) in [
            ("socket_timeout", &mut t.socket_timeout, d.socket_timeout),
            ("deadlock_timeout", &mut t.deadlock_timeout, d.deadlock_timeout),
            ("reap_timeout", &mut t.reap_timeout, d.reap_timeout),
            ("keep_alive_reap_timeout", &mut t.keep_alive_reap_timeout, d.keep_alive_reap_timeout),
            ("instrumented_reap_timeout", &mut t.instrumented_reap_timeout, d.instrumented_reap_timeout),
            ("usage_timeout", &mut t.usage_timeout, d.usage_timeout),
        ] {
            if *v == 0 {
                crate::log::warn(&format!("{name} is 0, using {fallback}"));
                *v = fallback;
            }
        }
        if t.deadlock_timeout < t.socket_timeout {
            crate::log::warn(&format!(
                "deadlock_timeout ({}) < socket_timeout ({}), queued requests may be cut off",
                t.deadlock_timeout, t.socket_timeout
            ));
        }
        if t.warm_up < 500 {
            crate::log::warn(&format!("warm_up is only {}ms, the target may not be listening yet", t.warm_up));
        }

        if !self.target.compile && !self.executable_path().exists() {
            crate::log::warn(&format!(
                "compilation disabled and {} does not exist",
                self.executable_path().display()
            ));
        }

        valid
    }
}

fn atomic_write(path: &str, content: &str) -> std::io::Result<()> {
    let tmp = format!("{path}.tmp");
    fs::write(&tmp, content)?;
    fs::rename(&tmp, path)?;
    Ok(())
}

/// Load the harness config. Returns `None` when the file exists but cannot be
/// used; a missing file is replaced by a generated default.
pub fn load_config() -> Option<Config> {
    let p = path();
    let mut cfg = match fs::read_to_string(&p) {
        Ok(txt) => match toml::from_str::<Config>(&txt) {
            Ok(c) => {
                crate::log::info(&format!("Loaded {p}"));
                c
            }
            Err(e) => {
                crate::log::error(&format!("Parse error {p}: {e}"));
                return None;
            }
        },
        Err(_) => {
            let cfg = Config::default();
            let content = generate_config(&cfg);
            if atomic_write(&p, &content).is_ok() {
                crate::log::info(&format!("Generated {p}"));
            } else {
                crate::log::warn(&format!("No config at '{p}', using defaults"));
            }
            cfg
        }
    };
    if !cfg.validate() {
        crate::log::error("Fatal configuration errors");
        return None;
    }
    Some(cfg)
}

fn str_array(v: &[String]) -> toml::Value {
    toml::Value::Array(v.iter().map(|s| toml::Value::String(s.clone())).collect())
}

pub fn generate_config(cfg: &Config) -> String {
    let mut doc = toml::Table::new();

    let mut h = toml::Table::new();
    h.insert("base_port".into(), toml::Value::Integer(cfg.harness.base_port as i64));
    h.insert("artifacts_dir".into(), toml::Value::String(cfg.harness.artifacts_dir.clone()));
    h.insert("log_level".into(), toml::Value::String(cfg.harness.log_level.clone()));
    h.insert("logging".into(), toml::Value::Boolean(cfg.harness.logging));
    doc.insert("harness".into(), toml::Value::Table(h));

    let mut t = toml::Table::new();
    t.insert("executable".into(), toml::Value::String(cfg.target.executable.clone()));
    t.insert("filter_file".into(), toml::Value::String(cfg.target.filter_file.clone()));
    t.insert("compile".into(), toml::Value::Boolean(cfg.target.compile));
    t.insert("compiler".into(), toml::Value::String(cfg.target.compiler.clone()));
    t.insert("source_dir".into(), toml::Value::String(cfg.target.source_dir.clone()));
    t.insert("compiler_flags".into(), str_array(&cfg.target.compiler_flags));
    t.insert("link_libs".into(), str_array(&cfg.target.link_libs));
    t.insert("binary_origin".into(), toml::Value::String(cfg.target.binary_origin.clone()));
    doc.insert("target".into(), toml::Value::Table(t));

    let mut tm = toml::Table::new();
    let tv = &cfg.timing;
    for (k, v) in [
        ("warm_up", tv.warm_up),
        ("socket_timeout", tv.socket_timeout),
        ("deadlock_timeout", tv.deadlock_timeout),
        ("reap_timeout", tv.reap_timeout),
        ("keep_alive_reap_timeout", tv.keep_alive_reap_timeout),
        ("instrumented_reap_timeout", tv.instrumented_reap_timeout),
        ("usage_timeout", tv.usage_timeout),
        ("fragment_delay", tv.fragment_delay),
    ] {
        tm.insert(k.into(), toml::Value::Integer(v as i64));
    }
    doc.insert("timing".into(), toml::Value::Table(tm));

    let mut i = toml::Table::new();
    i.insert("tool".into(), toml::Value::String(cfg.instrumentation.tool.clone()));
    i.insert("args".into(), str_array(&cfg.instrumentation.args));
    i.insert("log_file".into(), toml::Value::String(cfg.instrumentation.log_file.clone()));
    doc.insert("instrumentation".into(), toml::Value::Table(i));

    match toml::to_string_pretty(&doc) {
        Ok(s) => s,
        Err(e) => {
            crate::log::error(&format!("Config serialization failed: {e}"));
            String::new()
        }
    }
}

fn path() -> String {
    let args: Vec<String> = std::env::args().collect();
    args.windows(2)
        .find(|w| w[0] == "--config")
        .map(|w| w[1].clone())
        .unwrap_or_else(|| "harness.toml".to_string())
}
