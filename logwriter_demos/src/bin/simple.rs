// demo_simple — настройки из TOML-файла, несколько записей, завершение

use logwriter::{debug, error, info, warning, Logger, TomlSettings};

const SETTINGS: &str = r#"
[LoggingConfiguration]
EnableLog = 1
LogPath = "~/logs/simple.log"
LogSizeInKB = 1024
MaxLogFiles = 3
MinPriority = 1
MaxPriority = 4
"#;

fn main() {
    // 1. Настройки: в реальном приложении — TomlSettings::load("logging.toml")
    let settings = match TomlSettings::parse(SETTINGS) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("[FATAL] Bad logging settings: {}", e);
            std::process::exit(1);
        }
    };

    // 2. Инициализация: прошлый каталог logs/ уходит в резервную копию
    let logger = Logger::from_settings(&settings);
    logger.set_default_tag("demo_simple");

    // 3. Основной код
    debug!(logger, "Application initialized successfully");
    info!(logger, "Processing data block #{}", 1);
    warning!(logger, "Non-critical issue detected");
    error!(logger, "An error occurred, but we continue");

    // 4. Финальная часть
    if let Some(path) = logger.file_path() {
        println!("Log written to {}", path.display());
    }
}
