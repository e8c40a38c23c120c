use std::collections::HashMap;

/// The contents a [`FileResolver`] hands back for a resolved `#include` or
/// `#embed` target (spec §6 "Preprocessor file resolver").
#[derive(Debug, Clone)]
pub struct ResolvedFile {
    pub contents: String,
    /// The logical unit name to report diagnostics under, if different from
    /// the requested name. Returning empty `contents` with a sentinel
    /// `unit` is the documented way to signal a missing-but-recoverable
    /// header (spec §6).
    pub unit: Option<String>,
}

impl ResolvedFile {
    pub fn new(contents: impl Into<String>) -> Self {
        Self {
            contents: contents.into(),
            unit: None,
        }
    }

    pub fn with_unit(mut self, unit: impl Into<String>) -> Self {
        self.unit = Some(unit.into());
        self
    }
}

/// Resolves `#include`/`#embed` targets to file contents.
///
/// `start_relative` is true for a quoted `"name"` include, false for an
/// angle-bracketed `<name>`. `is_next` distinguishes `include_next`/
/// `embed_next` from their plain counterparts. `current_unit` is the
/// logical origin of the directive doing the including, used to resolve
/// relative paths and to resume a search after the directory that supplied
/// the current file (spec §11 supplement "`#include_next` directory-resume
/// semantics").
pub trait FileResolver {
    fn resolve(
        &mut self,
        name: &str,
        start_relative: bool,
        is_next: bool,
        is_include: bool,
        current_unit: Option<&str>,
    ) -> Option<ResolvedFile>;
}

/// A reference in-memory resolver keyed by unit name, for tests and
/// embedding scenarios that don't need real filesystem access. `include_next`
/// is modeled by keeping an ordered search list per name and resuming after
/// whichever entry matches `current_unit`.
#[derive(Debug, Clone, Default)]
pub struct InMemoryResolver {
    /// name -> ordered list of (unit, contents) entries, earliest-wins
    /// unless `is_next` asks to resume after `current_unit`.
    files: HashMap<String, Vec<(String, String)>>,
}

impl InMemoryResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a file reachable by `name`, under logical unit `unit`. Later
    /// registrations for the same `name` are layered after earlier ones, so
    /// `include_next` can resume past the first.
    pub fn add(&mut self, name: impl Into<String>, unit: impl Into<String>, contents: impl Into<String>) {
        self.files
            .entry(name.into())
            .or_default()
            .push((unit.into(), contents.into()));
    }
}

impl FileResolver for InMemoryResolver {
    fn resolve(
        &mut self,
        name: &str,
        _start_relative: bool,
        is_next: bool,
        _is_include: bool,
        current_unit: Option<&str>,
    ) -> Option<ResolvedFile> {
        let entries = self.files.get(name)?;
        if !is_next {
            let (unit, contents) = entries.first()?;
            return Some(ResolvedFile::new(contents.clone()).with_unit(unit.clone()));
        }

        let start = current_unit
            .and_then(|cur| entries.iter().position(|(unit, _)| unit == cur))
            .map(|idx| idx + 1)
            .unwrap_or(0);
        let (unit, contents) = entries.get(start)?;
        Some(ResolvedFile::new(contents.clone()).with_unit(unit.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_include_resolves_the_first_registered_file() {
        let mut resolver = InMemoryResolver::new();
        resolver.add("foo.h", "/usr/include/foo.h", "int x;");
        let resolved = resolver.resolve("foo.h", false, false, true, None).unwrap();
        assert_eq!(resolved.contents, "int x;");
    }

    #[test]
    fn include_next_resumes_after_the_current_unit() {
        let mut resolver = InMemoryResolver::new();
        resolver.add("foo.h", "/a/foo.h", "layer a");
        resolver.add("foo.h", "/b/foo.h", "layer b");
        let resolved = resolver
            .resolve("foo.h", false, true, true, Some("/a/foo.h"))
            .unwrap();
        assert_eq!(resolved.contents, "layer b");
    }

    #[test]
    fn missing_file_resolves_to_none() {
        let mut resolver = InMemoryResolver::new();
        assert!(resolver.resolve("missing.h", false, false, true, None).is_none());
    }
}
