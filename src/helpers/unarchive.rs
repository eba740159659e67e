use anyhow::{anyhow, Result};
use indicatif::{ProgressBar, ProgressStyle};
use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};
use zip::ZipArchive;

/// Extracts the zip at `archive` into `destination` on a blocking thread.
pub async fn start(archive: &Path, destination: &Path) -> Result<()> {
    let archive = archive.to_path_buf();
    let destination = destination.to_path_buf();

    match tokio::task::spawn_blocking(move || expand(&archive, &destination)).await {
        Ok(result) => result,
        Err(error) => Err(anyhow!(error)),
    }
}

/// Reconstructs every entry of the archive under `destination`.
///
/// Entry paths go through [`zip::read::ZipFile::enclosed_name`]; an entry that
/// would land outside `destination` aborts the extraction before anything is
/// written for it. Unix modes recorded in the archive are applied to files as
/// they are written and to directories once every entry is out, so a
/// read-only directory can still be filled.
///
/// # Errors
///
/// This function will return an error if:
///
/// * The archive could not be opened or is not a valid zip.
/// * An entry could not be read or escapes `destination`.
/// * A directory or output file could not be created or written.
fn expand(archive_path: &Path, destination: &Path) -> Result<()> {
    let file = match File::open(archive_path) {
        Ok(value) => value,
        Err(error) => {
            return Err(anyhow!(
                "Failed to open archive {}: {error}",
                archive_path.display()
            ));
        }
    };

    let mut archive = ZipArchive::new(file)?;
    let totalsize = archive.len() as u64;

    let pb = ProgressBar::new(totalsize);
    pb.set_style(
        ProgressStyle::default_bar()
            .template(
                "{msg}\n{spinner:.green} [{elapsed_precise}] [{wide_bar:.cyan/blue}] {pos}/{len}",
            )?
            .progress_chars("█  "),
    );
    pb.set_message("Expanding archive");

    let mut directory_modes: Vec<(PathBuf, u32)> = Vec::new();

    for i in 0..archive.len() {
        let mut file = archive.by_index(i)?;
        let outpath = match file.enclosed_name() {
            Some(path) => destination.join(path),
            None => {
                return Err(anyhow!(
                    "Archive entry {} escapes the destination directory",
                    file.name()
                ));
            }
        };

        if file.is_dir() {
            fs::create_dir_all(&outpath)?;
            if let Some(mode) = file.unix_mode() {
                directory_modes.push((outpath, mode));
            }
        } else {
            if let Some(parent) = outpath.parent() {
                if !parent.exists() {
                    fs::create_dir_all(parent)?;
                }
            }
            let mut outfile = match File::create(&outpath) {
                Ok(value) => value,
                Err(error) => {
                    return Err(anyhow!(
                        "Failed to create {}: {error}",
                        outpath.display()
                    ));
                }
            };
            io::copy(&mut file, &mut outfile)?;

            if let Some(mode) = file.unix_mode() {
                set_mode(&outpath, mode)?;
            }
        }
        pb.inc(1);
    }

    // deepest first, a parent losing its write bit must not block a child
    directory_modes.sort_by_key(|(path, _)| std::cmp::Reverse(path.components().count()));
    for (path, mode) in directory_modes {
        set_mode(&path, mode)?;
    }

    pb.finish_with_message(format!("Finished expanding to {}", destination.display()));

    Ok(())
}

fn set_mode(path: &Path, mode: u32) -> Result<()> {
    cfg_if::cfg_if! {
        if #[cfg(unix)] {
            use std::os::unix::fs::PermissionsExt;

            fs::set_permissions(path, fs::Permissions::from_mode(mode & 0o7777))?;
        } else {
            let _ = (path, mode);
        }
    }

    Ok(())
}
