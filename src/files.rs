//! Input file discovery for the CLI.
//!
//! Paths given on the command line are taken as-is when they are files.
//! Directories are walked recursively and filtered through the
//! `[extract].include_globs` / `exclude_globs` patterns, matched against the
//! path relative to the directory.

use anyhow::{bail, Result};
use globset::{GlobBuilder, GlobSet, GlobSetBuilder};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::config::ExtractConfig;

/// A file selected for ingestion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputFile {
    /// Display name: the file name for explicit paths, the relative path
    /// for files found by walking a directory.
    pub name: String,
    pub path: PathBuf,
}

pub fn collect_files(paths: &[PathBuf], config: &ExtractConfig) -> Result<Vec<InputFile>> {
    let include_set = build_globset(&config.include_globs)?;

    let mut default_excludes = vec!["**/.git/**".to_string(), "**/~$*".to_string()];
    default_excludes.extend(config.exclude_globs.clone());
    let exclude_set = build_globset(&default_excludes)?;

    let mut files = Vec::new();
    for root in paths {
        if root.is_file() {
            files.push(InputFile {
                name: file_name(root),
                path: root.clone(),
            });
            continue;
        }
        if !root.is_dir() {
            bail!("Input path does not exist: {}", root.display());
        }

        let mut found = Vec::new();
        let walker = WalkDir::new(root).follow_links(config.follow_symlinks);
        for entry in walker {
            let entry = entry?;
            if !entry.file_type().is_file() {
                continue;
            }

            let path = entry.path();
            let relative = path.strip_prefix(root).unwrap_or(path);
            let rel_str = relative.to_string_lossy().to_string();

            if exclude_set.is_match(&rel_str) || !include_set.is_match(&rel_str) {
                continue;
            }

            found.push(InputFile {
                name: rel_str,
                path: path.to_path_buf(),
            });
        }

        // Sort for deterministic ordering
        found.sort_by(|a, b| a.name.cmp(&b.name));
        files.extend(found);
    }

    Ok(files)
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string())
}

/// Globs match case-insensitively: `*.pdf` selects `Scan.PDF`.
fn build_globset(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        builder.add(GlobBuilder::new(pattern).case_insensitive(true).build()?);
    }
    Ok(builder.build()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn walks_directories_with_globs() {
        let tmp = tempfile::TempDir::new().unwrap();
        let root = tmp.path();
        fs::create_dir_all(root.join("sub")).unwrap();
        fs::write(root.join("b.docx"), b"x").unwrap();
        fs::write(root.join("sub/a.txt"), b"x").unwrap();
        fs::write(root.join("skip.exe"), b"x").unwrap();
        fs::write(root.join("~$lock.docx"), b"x").unwrap();

        let files = collect_files(&[root.to_path_buf()], &ExtractConfig::default()).unwrap();
        let names: Vec<&str> = files.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["b.docx", "sub/a.txt"]);
    }

    #[test]
    fn globs_ignore_extension_case() {
        let tmp = tempfile::TempDir::new().unwrap();
        let root = tmp.path();
        fs::write(root.join("QUY_DINH.DOCX"), b"x").unwrap();
        fs::write(root.join("Scan.PDF"), b"x").unwrap();
        fs::write(root.join("a.docx"), b"x").unwrap();
        fs::write(root.join("Setup.EXE"), b"x").unwrap();

        let files = collect_files(&[root.to_path_buf()], &ExtractConfig::default()).unwrap();
        let names: Vec<&str> = files.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["QUY_DINH.DOCX", "Scan.PDF", "a.docx"]);

        let config = ExtractConfig {
            exclude_globs: vec!["*.docx".to_string()],
            ..ExtractConfig::default()
        };
        let files = collect_files(&[root.to_path_buf()], &config).unwrap();
        let names: Vec<&str> = files.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["Scan.PDF"]);
    }

    #[test]
    fn explicit_files_bypass_globs() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("notes.log");
        fs::write(&path, b"x").unwrap();
        let files = collect_files(&[path.clone()], &ExtractConfig::default()).unwrap();
        assert_eq!(
            files,
            vec![InputFile {
                name: "notes.log".to_string(),
                path
            }]
        );
    }

    #[test]
    fn missing_path_is_an_error() {
        let err = collect_files(
            &[PathBuf::from("/definitely/not/here")],
            &ExtractConfig::default(),
        )
        .unwrap_err();
        assert!(err.to_string().contains("does not exist"));
    }
}
