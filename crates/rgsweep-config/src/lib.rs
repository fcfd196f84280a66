pub mod error;
pub mod settings;

pub use error::*;
pub use settings::*;

use std::path::{Path, PathBuf};
use tracing::debug;

/// 設定ファイルのパスを直接指定する環境変数
pub const CONFIG_ENV: &str = "RGSWEEP_CONFIG";

/// カレントディレクトリで探すファイル名 (優先順)
const CANDIDATES: [&str; 3] = ["rgsweep.local.yaml", "rgsweep.yaml", ".rgsweep.yaml"];

/// rgsweepの設定ディレクトリ (~/.config/rgsweep)
pub fn get_config_dir() -> Result<PathBuf> {
    let config_dir = dirs::config_dir()
        .ok_or(ConfigError::ConfigDirNotFound)?
        .join("rgsweep");
    Ok(config_dir)
}

/// 設定ファイルを探す
///
/// 以下の優先順位で検索し、見つからなければ `None`:
/// 1. 環境変数 RGSWEEP_CONFIG (直接パス指定。存在しなければエラー)
/// 2. カレントディレクトリ: rgsweep.local.yaml, rgsweep.yaml, .rgsweep.yaml
/// 3. ~/.config/rgsweep/config.yaml (グローバル設定)
pub fn find_config_file() -> Result<Option<PathBuf>> {
    // 1. 環境変数で直接指定
    if let Ok(config_path) = std::env::var(CONFIG_ENV) {
        let path = PathBuf::from(config_path);
        if path.exists() {
            return Ok(Some(path));
        }
        return Err(ConfigError::ConfigFileNotFound(path));
    }

    // 2. カレントディレクトリで検索
    let current_dir = std::env::current_dir()?;
    for filename in &CANDIDATES {
        let path = current_dir.join(filename);
        if path.exists() {
            return Ok(Some(path));
        }
    }

    // 3. グローバル設定ファイル
    if let Some(config_dir) = dirs::config_dir() {
        let global_config = config_dir.join("rgsweep").join("config.yaml");
        if global_config.exists() {
            return Ok(Some(global_config));
        }
    }

    Ok(None)
}

/// 設定を読み込む (ファイルがなければ既定値)
pub fn load() -> Result<Settings> {
    match find_config_file()? {
        Some(path) => load_from(&path),
        None => {
            debug!("no config file found; using defaults");
            Ok(Settings::default())
        }
    }
}

/// 指定したファイルから設定を読み込む
pub fn load_from(path: &Path) -> Result<Settings> {
    if !path.exists() {
        return Err(ConfigError::ConfigFileNotFound(path.to_path_buf()));
    }
    let content = std::fs::read_to_string(path)?;
    let settings = Settings::from_yaml(&content).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    settings.validate()?;
    debug!(path = %path.display(), "config loaded");
    Ok(settings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::fs;

    #[test]
    fn test_get_config_dir() {
        let config_dir = get_config_dir().unwrap();
        assert!(config_dir.ends_with("rgsweep"));
    }

    #[test]
    #[serial]
    fn test_find_config_file_in_current_dir() {
        let temp_dir = tempfile::tempdir().unwrap();
        let original_dir = std::env::current_dir().unwrap();

        fs::write(temp_dir.path().join("rgsweep.yaml"), "# test").unwrap();

        // テンポラリディレクトリに移動
        std::env::set_current_dir(&temp_dir).unwrap();

        let config_file = find_config_file().unwrap().unwrap();
        assert!(config_file.ends_with("rgsweep.yaml"));

        // 元のディレクトリに戻る
        std::env::set_current_dir(original_dir).unwrap();
    }

    #[test]
    #[serial]
    fn test_find_config_file_local_priority() {
        let temp_dir = tempfile::tempdir().unwrap();
        let original_dir = std::env::current_dir().unwrap();

        // rgsweep.yaml と rgsweep.local.yaml の両方を作成
        fs::write(temp_dir.path().join("rgsweep.yaml"), "# shared").unwrap();
        fs::write(temp_dir.path().join("rgsweep.local.yaml"), "# local").unwrap();
        fs::write(temp_dir.path().join(".rgsweep.yaml"), "# hidden").unwrap();

        std::env::set_current_dir(&temp_dir).unwrap();

        // rgsweep.local.yaml が優先される
        let result = find_config_file().unwrap().unwrap();
        assert!(result.ends_with("rgsweep.local.yaml"));

        std::env::set_current_dir(original_dir).unwrap();
    }

    #[test]
    #[serial]
    fn test_find_config_file_env_var() {
        let temp_dir = tempfile::tempdir().unwrap();
        let config_path = temp_dir.path().join("custom.yaml");
        fs::write(&config_path, "retry:\n  max_attempts: 7\n").unwrap();

        unsafe {
            std::env::set_var(CONFIG_ENV, config_path.to_str().unwrap());
        }

        let result = find_config_file().unwrap();
        assert_eq!(result, Some(config_path));
        assert_eq!(load().unwrap().retry.max_attempts, 7);

        // クリーンアップ
        unsafe {
            std::env::remove_var(CONFIG_ENV);
        }
    }

    #[test]
    #[serial]
    fn test_env_var_pointing_nowhere_is_error() {
        unsafe {
            std::env::set_var(CONFIG_ENV, "/nonexistent/rgsweep.yaml");
        }

        let result = find_config_file();
        assert!(matches!(result, Err(ConfigError::ConfigFileNotFound(_))));

        unsafe {
            std::env::remove_var(CONFIG_ENV);
        }
    }

    #[test]
    #[serial]
    fn test_load_without_file_uses_defaults() {
        let temp_dir = tempfile::tempdir().unwrap();
        let original_dir = std::env::current_dir().unwrap();

        // 空のディレクトリに移動
        std::env::set_current_dir(&temp_dir).unwrap();

        // グローバル設定がある環境では比較しない
        if find_config_file().unwrap().is_none() {
            assert_eq!(load().unwrap(), Settings::default());
        }

        std::env::set_current_dir(original_dir).unwrap();
    }

    #[test]
    fn test_load_from_reports_parse_error() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("broken.yaml");
        fs::write(&path, "retry: [1, 2").unwrap();

        let result = load_from(&path);
        assert!(matches!(result, Err(ConfigError::Parse { .. })));
    }

    #[test]
    fn test_load_from_validates() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("rgsweep.yaml");
        fs::write(&path, "retry:\n  max_attempts: 0\n").unwrap();

        let result = load_from(&path);
        assert!(matches!(result, Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_load_from_missing_file() {
        let result = load_from(Path::new("/nonexistent/rgsweep.yaml"));
        assert!(matches!(result, Err(ConfigError::ConfigFileNotFound(_))));
    }
}
