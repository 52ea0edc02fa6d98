//! Atomic persistence of the account store (see spec §4.5.6).

use std::{collections::BTreeMap, io, path::Path};

use crate::model::Account;

/// Writes `accounts` to `path` atomically: a temp file in the same
/// directory is written and `fsync`'d, then renamed over the target.
/// Readers of `path` never observe a partial file.
pub fn save(path: &Path, accounts: &BTreeMap<String, Account>) -> io::Result<()> {
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    std::fs::create_dir_all(dir)?;

    let mut tmp = tempfile::NamedTempFile::new_in(dir)?;

    let result = (|| {
        serde_json::to_writer_pretty(tmp.as_file_mut(), accounts)?;
        tmp.as_file_mut().sync_all()?;
        Ok::<_, io::Error>(())
    })();

    match result {
        Ok(()) => tmp.persist(path).map(|_| ()).map_err(|e| e.error),
        Err(e) => {
            // NamedTempFile removes itself on drop; nothing else to unlink.
            Err(e)
        }
    }
}

/// Reads the account store from `path`. A missing file is treated as an
/// empty pool; a file that fails to parse is logged and also treated as
/// empty rather than aborting startup.
pub fn load(path: &Path) -> BTreeMap<String, Account> {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return BTreeMap::new(),
        Err(err) => {
            log::warn!("Failed to read accounts file {}: {err}", path.display());
            return BTreeMap::new();
        }
    };

    match serde_json::from_str(&content) {
        Ok(accounts) => accounts,
        Err(err) => {
            log::error!("Failed to parse accounts file {}: {err}", path.display());
            BTreeMap::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use secrecy::SecretString;

    use super::*;
    use crate::model::Account;

    #[test]
    fn round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("accounts.json");

        let mut accounts = BTreeMap::new();
        let account = Account::new(
            "org-1".to_string(),
            Some(SecretString::from("cookie")),
            None,
            vec!["pro".to_string()],
        );
        accounts.insert(account.organization_uuid.clone(), account);

        save(&path, &accounts).unwrap();
        let loaded = load(&path);

        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded["org-1"].organization_uuid, "org-1");
    }

    #[test]
    fn missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nope.json");

        assert!(load(&path).is_empty());
    }
}
