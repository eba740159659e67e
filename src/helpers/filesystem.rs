use anyhow::{anyhow, Result};
use std::io::ErrorKind;
use std::path::Path;
use tokio::fs;

/// Moves the children of the single folder inside `source` into `destination`.
///
/// Zipballs wrap everything in one root folder (`owner-repo-sha/`), this
/// strips that level. Moves already done are kept if a later one fails.
pub async fn move_nested_contents(source: &Path, destination: &Path) -> Result<()> {
    let mut entries = match fs::read_dir(source).await {
        Ok(entries) => entries,
        Err(error) => {
            return Err(anyhow!(
                "Failed to read extracted contents in {}: {error}",
                source.display()
            ));
        }
    };

    let mut roots = Vec::new();
    while let Some(entry) = entries.next_entry().await? {
        roots.push(entry);
    }

    let root = match roots.as_slice() {
        [] => return Err(anyhow!("No folders found in {}", source.display())),
        [root] => root,
        _ => {
            return Err(anyhow!(
                "Expected a single root folder in {}, found {} entries",
                source.display(),
                roots.len()
            ));
        }
    };

    if !root.file_type().await?.is_dir() {
        return Err(anyhow!(
            "Expected a directory at {}, found a file",
            root.path().display()
        ));
    }

    let mut children = fs::read_dir(root.path()).await?;
    while let Some(child) = children.next_entry().await? {
        let from = child.path();
        let to = destination.join(child.file_name());

        if let Err(error) = fs::rename(&from, &to).await {
            return Err(anyhow!(
                "Failed to move {} to {}: {error}",
                from.display(),
                to.display()
            ));
        }
    }

    Ok(())
}

/// Recursively removes `path`, or just unlinks it when it is a file or symlink.
/// A path that is already gone counts as removed.
pub async fn remove_dir(path: &Path) -> Result<()> {
    let result = match fs::symlink_metadata(path).await {
        Ok(metadata) if metadata.is_dir() => fs::remove_dir_all(path).await,
        Ok(_) => fs::remove_file(path).await,
        Err(error) => Err(error),
    };

    match result {
        Ok(()) => Ok(()),
        Err(error) if error.kind() == ErrorKind::NotFound => Ok(()),
        Err(error) => Err(anyhow!("Failed to remove {}: {error}", path.display())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs as std_fs;
    use tempfile::TempDir;

    fn setup() -> (TempDir, std::path::PathBuf, std::path::PathBuf) {
        let dir = TempDir::new().unwrap();
        let source = dir.path().join("temp");
        let destination = dir.path().join("unzipped");
        std_fs::create_dir(&source).unwrap();
        std_fs::create_dir(&destination).unwrap();
        (dir, source, destination)
    }

    #[tokio::test]
    async fn moves_children_of_root_folder() {
        let (_dir, source, destination) = setup();
        let root = source.join("owner-repo-abc123");
        std_fs::create_dir_all(root.join("docs")).unwrap();
        std_fs::write(root.join("README.md"), "hello").unwrap();
        std_fs::write(root.join("docs/guide.md"), "guide").unwrap();

        move_nested_contents(&source, &destination).await.unwrap();

        assert_eq!(
            std_fs::read_to_string(destination.join("README.md")).unwrap(),
            "hello"
        );
        assert_eq!(
            std_fs::read_to_string(destination.join("docs/guide.md")).unwrap(),
            "guide"
        );
        assert_eq!(std_fs::read_dir(&root).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn empty_source_is_an_error() {
        let (_dir, source, destination) = setup();

        let error = move_nested_contents(&source, &destination)
            .await
            .unwrap_err();
        assert!(error.to_string().contains("No folders found"));
    }

    #[tokio::test]
    async fn several_roots_are_an_error() {
        let (_dir, source, destination) = setup();
        std_fs::create_dir(source.join("a")).unwrap();
        std_fs::create_dir(source.join("b")).unwrap();

        let error = move_nested_contents(&source, &destination)
            .await
            .unwrap_err();
        assert!(error.to_string().contains("found 2 entries"));
    }

    #[tokio::test]
    async fn file_root_is_an_error() {
        let (_dir, source, destination) = setup();
        std_fs::write(source.join("README.md"), "loose").unwrap();

        let error = move_nested_contents(&source, &destination)
            .await
            .unwrap_err();
        assert!(error.to_string().contains("Expected a directory"));
    }

    #[tokio::test]
    async fn missing_source_is_an_error() {
        let (dir, _source, destination) = setup();

        assert!(
            move_nested_contents(&dir.path().join("nope"), &destination)
                .await
                .is_err()
        );
    }

    #[tokio::test]
    async fn remove_dir_handles_existing_and_missing() {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("unzipped-x");
        std_fs::create_dir_all(target.join("nested")).unwrap();
        std_fs::write(target.join("nested/file.txt"), "x").unwrap();

        remove_dir(&target).await.unwrap();
        assert!(!target.exists());

        remove_dir(&target).await.unwrap();
    }

    #[tokio::test]
    async fn remove_dir_removes_plain_file() {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("unzipped-x");
        std_fs::write(&target, "not a directory").unwrap();

        remove_dir(&target).await.unwrap();

        assert!(!target.exists());
        assert!(dir.path().exists());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn remove_dir_unlinks_symlink_without_following() {
        let dir = TempDir::new().unwrap();
        let real = dir.path().join("real");
        std_fs::create_dir(&real).unwrap();
        std_fs::write(real.join("keep.txt"), "keep").unwrap();
        let link = dir.path().join("unzipped-x");
        std::os::unix::fs::symlink(&real, &link).unwrap();

        remove_dir(&link).await.unwrap();

        assert!(std_fs::symlink_metadata(&link).is_err());
        assert!(real.join("keep.txt").exists());
    }

    #[tokio::test]
    async fn failed_move_keeps_earlier_moves() {
        let (_dir, source, destination) = setup();
        let root = source.join("owner-repo-abc123");
        std_fs::create_dir_all(root.join("docs")).unwrap();
        std_fs::write(root.join("docs/new.md"), "new").unwrap();
        std_fs::write(root.join("README.md"), "hello").unwrap();
        std_fs::create_dir(destination.join("docs")).unwrap();
        std_fs::write(destination.join("docs/old.md"), "old").unwrap();

        let error = move_nested_contents(&source, &destination)
            .await
            .unwrap_err();

        assert!(error.to_string().contains("Failed to move"));
        assert_eq!(
            std_fs::read_to_string(destination.join("docs/old.md")).unwrap(),
            "old"
        );
        assert!(root.join("docs/new.md").exists());
        // README may or may not have gone first, but it is never lost or duplicated
        let moved = destination.join("README.md").exists();
        let left = root.join("README.md").exists();
        assert!(moved != left);
    }
}
