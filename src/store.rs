// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

//! # 存储层
//!
//! 数据目录被抽象为一个以文件名为键的键值存储 [`FileStore`]，
//! 路由守卫与处理函数只通过该接口访问文件系统。
//!
//! - [`DirStore`]：基于真实目录的实现。创建使用独占创建（`create_new`），
//!   重命名使用“硬链接 + 删除原文件”，目标已存在时不会被覆盖。
//! - [`MemoryStore`]：内存实现，用于测试。

use crate::exception::Exception;

use log::{debug, warn};

use std::{
    collections::BTreeMap,
    fs::{self, OpenOptions},
    io::{self, Write},
    path::{Path, PathBuf},
    sync::Mutex,
};

/// 文本文件存储接口
#[cfg_attr(test, mockall::automock)]
pub trait FileStore: Send + Sync {
    /// 当前存在的全部文件名，每次调用都重新读取
    fn list(&self) -> Result<Vec<String>, Exception>;

    /// 读取文件的完整内容
    fn read(&self, name: &str) -> Result<String, Exception>;

    /// 仅当 `name` 不存在时创建文件，否则返回 `FileAlreadyExists`
    fn create(&self, name: &str, content: &str) -> Result<(), Exception>;

    /// 覆盖已有文件的内容，文件不存在时返回 `FileNotFound`
    fn write(&self, name: &str, content: &str) -> Result<(), Exception>;

    /// 重命名，`to` 已存在时返回 `FileAlreadyExists`
    fn rename(&self, from: &str, to: &str) -> Result<(), Exception>;

    /// 删除文件
    fn delete(&self, name: &str) -> Result<(), Exception>;

    /// 存在性查询：重新列出目录并做线性成员判断
    fn exists(&self, name: &str) -> Result<bool, Exception> {
        Ok(self.list()?.iter().any(|n| n == name))
    }
}

/// 以目录为后端的存储
pub struct DirStore {
    root: PathBuf,
}

impl DirStore {
    /// 打开数据目录，不存在时创建
    pub fn open<P: AsRef<Path>>(root: P) -> Result<Self, Exception> {
        let root = root.as_ref().to_path_buf();
        if !root.is_dir() {
            warn!("数据目录{}不存在，将自动创建", root.display());
            fs::create_dir_all(&root)?;
        }
        Ok(Self { root })
    }

    // 调用方保证 name 已通过文件名校验，不含路径分隔符
    fn path_of(&self, name: &str) -> PathBuf {
        self.root.join(name)
    }
}

impl FileStore for DirStore {
    fn list(&self) -> Result<Vec<String>, Exception> {
        let mut names = Vec::new();
        for entry in fs::read_dir(&self.root)? {
            let entry = entry?;
            if entry.file_type()?.is_file() {
                names.push(entry.file_name().to_string_lossy().into_owned());
            }
        }
        Ok(names)
    }

    fn read(&self, name: &str) -> Result<String, Exception> {
        let bytes = fs::read(self.path_of(name))?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    fn create(&self, name: &str, content: &str) -> Result<(), Exception> {
        let mut file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(self.path_of(name))?;
        file.write_all(content.as_bytes())?;
        Ok(())
    }

    fn write(&self, name: &str, content: &str) -> Result<(), Exception> {
        // 不带 create 标志，文件在守卫之后被删除时返回 NotFound 而不是悄悄重建
        let mut file = OpenOptions::new()
            .write(true)
            .truncate(true)
            .open(self.path_of(name))?;
        file.write_all(content.as_bytes())?;
        Ok(())
    }

    fn rename(&self, from: &str, to: &str) -> Result<(), Exception> {
        let source = self.path_of(from);
        let target = self.path_of(to);
        match fs::hard_link(&source, &target) {
            Ok(()) => unlink_source(&source, &target),
            Err(e) if matches!(e.kind(), io::ErrorKind::AlreadyExists | io::ErrorKind::NotFound) => {
                Err(e.into())
            }
            Err(e) => {
                // 部分文件系统不支持硬链接，退回到先检查再重命名
                debug!("硬链接{}失败（{}），改用rename", target.display(), e);
                if target.exists() {
                    return Err(Exception::FileAlreadyExists);
                }
                fs::rename(&source, &target)?;
                Ok(())
            }
        }
    }

    fn delete(&self, name: &str) -> Result<(), Exception> {
        fs::remove_file(self.path_of(name))?;
        Ok(())
    }
}

// 硬链接已建立后删除原名。失败时撤销新链接，两个名字不会同时留在目录中
fn unlink_source(source: &Path, target: &Path) -> Result<(), Exception> {
    if let Err(e) = fs::remove_file(source) {
        warn!("删除{}失败（{}），撤销链接{}", source.display(), e, target.display());
        let _ = fs::remove_file(target);
        return Err(e.into());
    }
    Ok(())
}

/// 内存存储，列表按文件名排序
#[derive(Default)]
pub struct MemoryStore {
    files: Mutex<BTreeMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn files(&self) -> std::sync::MutexGuard<'_, BTreeMap<String, String>> {
        match self.files.lock() {
            Ok(lock) => lock,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

impl FileStore for MemoryStore {
    fn list(&self) -> Result<Vec<String>, Exception> {
        Ok(self.files().keys().cloned().collect())
    }

    fn read(&self, name: &str) -> Result<String, Exception> {
        self.files()
            .get(name)
            .cloned()
            .ok_or(Exception::FileNotFound)
    }

    fn create(&self, name: &str, content: &str) -> Result<(), Exception> {
        let mut files = self.files();
        if files.contains_key(name) {
            return Err(Exception::FileAlreadyExists);
        }
        files.insert(name.to_string(), content.to_string());
        Ok(())
    }

    fn write(&self, name: &str, content: &str) -> Result<(), Exception> {
        match self.files().get_mut(name) {
            Some(existing) => {
                *existing = content.to_string();
                Ok(())
            }
            None => Err(Exception::FileNotFound),
        }
    }

    fn rename(&self, from: &str, to: &str) -> Result<(), Exception> {
        let mut files = self.files();
        if files.contains_key(to) {
            return Err(Exception::FileAlreadyExists);
        }
        let content = files.remove(from).ok_or(Exception::FileNotFound)?;
        files.insert(to.to_string(), content);
        Ok(())
    }

    fn delete(&self, name: &str) -> Result<(), Exception> {
        self.files()
            .remove(name)
            .map(|_| ())
            .ok_or(Exception::FileNotFound)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn sorted(mut names: Vec<String>) -> Vec<String> {
        names.sort();
        names
    }

    #[test]
    fn test_dir_store_creates_missing_root() {
        let dir = tempdir().unwrap();
        let root = dir.path().join("data");
        let store = DirStore::open(&root).unwrap();
        assert!(root.is_dir());
        assert!(store.list().unwrap().is_empty());
    }

    #[test]
    fn test_failed_unlink_rolls_back_link() {
        let dir = tempdir().unwrap();
        let source = dir.path().join("gone.txt");
        let target = dir.path().join("linked.txt");
        fs::write(&target, "content").unwrap();

        let result = unlink_source(&source, &target);
        assert_eq!(result, Err(Exception::FileNotFound));
        assert!(!target.exists());
    }

    #[test]
    fn test_dir_store_round_trip() {
        let dir = tempdir().unwrap();
        let store = DirStore::open(dir.path()).unwrap();

        store.create("note.txt", "hello").unwrap();
        assert_eq!(store.read("note.txt").unwrap(), "hello");
        assert!(store.exists("note.txt").unwrap());
        assert!(!store.exists("other.txt").unwrap());
    }

    #[test]
    fn test_dir_store_create_is_exclusive() {
        let dir = tempdir().unwrap();
        let store = DirStore::open(dir.path()).unwrap();

        store.create("a.txt", "first").unwrap();
        assert_eq!(
            store.create("a.txt", "second"),
            Err(Exception::FileAlreadyExists)
        );
        assert_eq!(store.read("a.txt").unwrap(), "first");
    }

    #[test]
    fn test_dir_store_write_requires_existing_file() {
        let dir = tempdir().unwrap();
        let store = DirStore::open(dir.path()).unwrap();

        assert_eq!(store.write("a.txt", "x"), Err(Exception::FileNotFound));
        store.create("a.txt", "a longer original").unwrap();
        store.write("a.txt", "short").unwrap();
        assert_eq!(store.read("a.txt").unwrap(), "short");
    }

    #[test]
    fn test_dir_store_rename_does_not_overwrite() {
        let dir = tempdir().unwrap();
        let store = DirStore::open(dir.path()).unwrap();

        store.create("a.txt", "a").unwrap();
        store.create("b.txt", "b").unwrap();
        assert_eq!(
            store.rename("a.txt", "b.txt"),
            Err(Exception::FileAlreadyExists)
        );
        assert_eq!(store.read("b.txt").unwrap(), "b");

        store.rename("a.txt", "c.txt").unwrap();
        assert_eq!(
            sorted(store.list().unwrap()),
            vec!["b.txt".to_string(), "c.txt".to_string()]
        );
        assert_eq!(store.read("c.txt").unwrap(), "a");
    }

    #[test]
    fn test_dir_store_list_skips_directories() {
        let dir = tempdir().unwrap();
        fs::create_dir(dir.path().join("nested.d")).unwrap();
        let store = DirStore::open(dir.path()).unwrap();
        store.create("only.txt", "").unwrap();

        assert_eq!(store.list().unwrap(), vec!["only.txt".to_string()]);
    }

    #[test]
    fn test_dir_store_delete() {
        let dir = tempdir().unwrap();
        let store = DirStore::open(dir.path()).unwrap();

        store.create("gone.txt", "bye").unwrap();
        store.delete("gone.txt").unwrap();
        assert_eq!(store.read("gone.txt"), Err(Exception::FileNotFound));
        assert_eq!(store.delete("gone.txt"), Err(Exception::FileNotFound));
    }

    #[test]
    fn test_memory_store_behaves_like_dir_store() {
        let store = MemoryStore::new();

        store.create("b.txt", "b").unwrap();
        store.create("a.txt", "a").unwrap();
        assert_eq!(store.create("a.txt", "again"), Err(Exception::FileAlreadyExists));
        assert_eq!(store.list().unwrap(), vec!["a.txt".to_string(), "b.txt".to_string()]);

        assert_eq!(store.rename("a.txt", "b.txt"), Err(Exception::FileAlreadyExists));
        store.rename("a.txt", "c.txt").unwrap();
        store.write("c.txt", "changed").unwrap();
        assert_eq!(store.read("c.txt").unwrap(), "changed");

        store.delete("b.txt").unwrap();
        assert!(!store.exists("b.txt").unwrap());
        assert_eq!(store.write("b.txt", "x"), Err(Exception::FileNotFound));
    }
}
