use crate::error::{AppError, AppResult, FileError};
use crate::models::field_map::FieldMap;
use std::path::Path;
use tokio::fs;

/// 从 TOML 文件加载字段定位器
///
/// 文件中未出现的字段沿用默认定位器，写成空字符串的可选字段会被关闭
pub async fn load_field_map(toml_file_path: &Path) -> AppResult<FieldMap> {
    let content = fs::read_to_string(toml_file_path).await.map_err(|e| {
        AppError::File(FileError::ReadFailed {
            path: toml_file_path.display().to_string(),
            source: Box::new(e),
        })
    })?;

    let map = parse_field_map(&content, &toml_file_path.display().to_string())?;
    tracing::info!(
        "已加载字段定位器: {}",
        toml_file_path.file_name().unwrap_or_default().to_string_lossy()
    );
    Ok(map)
}

/// 解析 TOML 文本为 `FieldMap`
pub fn parse_field_map(content: &str, origin: &str) -> AppResult<FieldMap> {
    let map: FieldMap = toml::from_str(content).map_err(|e| {
        AppError::File(FileError::TomlParseFailed {
            path: origin.to_string(),
            source: Box::new(e),
        })
    })?;
    Ok(map.normalized())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overlay_keeps_defaults_for_missing_keys() {
        let map = parse_field_map(
            r##"
            title = "#post-title"
            body = "textarea#content"
            summary = ""
            "##,
            "inline",
        )
        .unwrap();

        assert_eq!(map.title, "#post-title");
        assert_eq!(map.body, "textarea#content");
        assert!(map.summary.is_none());
        assert_eq!(map.username, FieldMap::default().username);
    }

    #[test]
    fn test_invalid_toml_reports_origin() {
        let err = parse_field_map("title = [", "fields.toml").unwrap_err();
        assert!(err.to_string().contains("fields.toml"));
    }

    #[tokio::test]
    async fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fields.toml");
        std::fs::write(&path, "publish = \"#go\"\n").unwrap();

        let map = load_field_map(&path).await.unwrap();
        assert_eq!(map.publish, "#go");
    }
}
