use crate::models::TransactionRecord;
use crate::store::RecordStore;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("无法打开记录文件 {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("记录 JSON 解析失败: {0}")]
    Json(#[from] serde_json::Error),
}

/// 启动时一次性加载交易记录 (JSON 数组)
pub fn load_records(path: impl AsRef<Path>) -> Result<RecordStore, StoreError> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|source| StoreError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let store = records_from_reader(BufReader::new(file))?;
    tracing::info!("Loaded {} records from {}", store.len(), path.display());
    Ok(store)
}

pub fn records_from_reader<R: Read>(reader: R) -> Result<RecordStore, StoreError> {
    let records: Vec<TransactionRecord> = serde_json::from_reader(reader)?;
    let undated = records.iter().filter(|r| r.parsed_date().is_none()).count();
    if undated > 0 {
        tracing::debug!("{} 条记录日期无法解析, 将不参与月度汇总", undated);
    }
    Ok(RecordStore::new(records))
}
