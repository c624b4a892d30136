// demo_alerts — запись цепочки ошибок и оповещения.
// SMTP-сервер по умолчанию недоступен: письмо молча не уйдёт, запись в
// системный журнал и в файл всё равно будут сделаны.

use std::collections::HashMap;
use std::thread;
use std::time::Duration;

use logwriter::Logger;

#[derive(Debug, thiserror::Error)]
#[error("failed to load configuration '{name}'")]
struct LoadError {
    name: String,
    #[source]
    source: std::io::Error,
}

fn main() {
    let settings: HashMap<String, String> = [
        ("EnableLog", "1"),
        ("LogPath", "~/logs/alerts/alerts.log"),
        ("MinPriority", "1"),
        ("MaxPriority", "4"),
        ("AlertLevel", "1"),
        ("MailServer", "localhost"),
        ("MailPort", "2525"),
        ("Recipients", "ops@example.com;;oncall@example.com;"),
    ]
    .iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect();

    let logger = Logger::from_settings(&settings);

    let error = LoadError {
        name: "billing.toml".to_owned(),
        source: std::io::Error::new(std::io::ErrorKind::NotFound, "no such file"),
    };
    logger.write_exception(&error);

    // Оповещения уходят в фоне; даём воркерам время, иначе процесс завершится раньше
    thread::sleep(Duration::from_secs(2));
    println!("{:?}", logger.diagnostics());
}
