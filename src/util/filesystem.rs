//
//  Copyright (C) 2022-2024  Chase Ruskin
//
//  This program is free software: you can redistribute it and/or modify
//  it under the terms of the GNU General Public License as published by
//  the Free Software Foundation, either version 3 of the License, or
//  (at your option) any later version.
//
//  This program is distributed in the hope that it will be useful,
//  but WITHOUT ANY WARRANTY; without even the implied warranty of
//  MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
//  GNU General Public License for more details.
//
//  You should have received a copy of the GNU General Public License
//  along with this program.  If not, see <http://www.gnu.org/licenses/>.
//

use crate::error::Error;
use crate::error::LastError;
use std::path::Path;
use std::path::PathBuf;

/// The file extension of a design source file.
pub const SOURCE_EXTENSION: &str = "vbi";

/// Locates the source file that defines a module referenced by an
/// instantiation statement.
///
/// The `libraries` list carries the design's `#library` directive paths in
/// declaration order; they are searched before the resolver's own roots.
pub trait SourceResolver {
    fn resolve(&self, name: &str, libraries: &[String]) -> Option<PathBuf>;
}

/// Resolves modules against the directory holding the current design file.
#[derive(Debug, PartialEq, Clone)]
pub struct FileResolver {
    root: PathBuf,
}

impl FileResolver {
    /// Creates a resolver rooted at the directory `root`.
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    /// Creates a resolver rooted at the directory containing `file`.
    pub fn sibling_of<P: AsRef<Path>>(file: P) -> Self {
        let root = match file.as_ref().parent() {
            Some(dir) => dir.to_path_buf(),
            None => PathBuf::from("."),
        };
        Self { root: root }
    }
}

impl SourceResolver for FileResolver {
    fn resolve(&self, name: &str, libraries: &[String]) -> Option<PathBuf> {
        let mut dirs: Vec<PathBuf> = libraries
            .iter()
            .map(|lib| resolve_rel_path(&self.root, lib))
            .collect();
        dirs.push(self.root.clone());
        for dir in dirs {
            let candidate = dir.join(format!("{}.{}", name, SOURCE_EXTENSION));
            if candidate.is_file() == true {
                return Some(candidate);
            }
        }
        None
    }
}

/// A resolver that knows no modules; instantiations always fail to bind.
#[derive(Debug, PartialEq)]
pub struct NullResolver;

impl SourceResolver for NullResolver {
    fn resolve(&self, _: &str, _: &[String]) -> Option<PathBuf> {
        None
    }
}

/// Joins a relative path onto `root`, passing an already-absolute `path`
/// through untouched.
pub fn resolve_rel_path(root: &Path, path: &str) -> PathBuf {
    let p = PathBuf::from(path);
    match p.is_absolute() {
        true => p,
        false => root.join(p),
    }
}

/// Reads the design source at `path` as UTF-8 text.
pub fn read_source(path: &Path) -> Result<String, Error> {
    std::fs::read_to_string(path)
        .map_err(|e| Error::SourceRead(path.to_path_buf(), LastError(e.to_string())))
}

#[cfg(test)]
mod test {
    use super::*;
    use std::io::Write;

    #[test]
    fn ut_resolve_in_root() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Add.vbi");
        let mut f = std::fs::File::create(&path).unwrap();
        writeln!(f, "s = x ^ y;").unwrap();
        let resolver = FileResolver::new(dir.path());
        assert_eq!(resolver.resolve("Add", &[]), Some(path));
        assert_eq!(resolver.resolve("Missing", &[]), None);
    }

    #[test]
    fn ut_resolve_prefers_library() {
        let dir = tempfile::tempdir().unwrap();
        let lib = dir.path().join("libs");
        std::fs::create_dir(&lib).unwrap();
        let in_lib = lib.join("Add.vbi");
        std::fs::File::create(&in_lib).unwrap();
        let in_root = dir.path().join("Add.vbi");
        std::fs::File::create(&in_root).unwrap();
        let resolver = FileResolver::new(dir.path());
        // the library directory wins over the design's own directory
        assert_eq!(
            resolver.resolve("Add", &[String::from("libs")]),
            Some(in_lib)
        );
    }

    #[test]
    fn ut_read_source_missing() {
        let dir = tempfile::tempdir().unwrap();
        assert!(read_source(&dir.path().join("nope.vbi")).is_err());
    }
}
