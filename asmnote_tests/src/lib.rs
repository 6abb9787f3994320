use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, OnceLock};

static PATH_LOCK: OnceLock<Mutex<()>> = OnceLock::new();

/// Prepends a directory of fake tool scripts to PATH for the duration of a
/// test. Holds a process-wide lock so tests that rewrite PATH cannot race.
pub struct PathPrepend {
    saved: std::ffi::OsString,
    _guard: MutexGuard<'static, ()>,
}

impl PathPrepend {
    pub fn new(dir: &Path) -> Self {
        let guard = PATH_LOCK
            .get_or_init(|| Mutex::new(()))
            .lock()
            .unwrap_or_else(|e| e.into_inner());
        let saved = std::env::var_os("PATH").unwrap_or_default();
        let mut paths = vec![dir.to_path_buf()];
        paths.extend(std::env::split_paths(&saved));
        let joined = std::env::join_paths(paths).expect("PATH entries should join");
        unsafe { std::env::set_var("PATH", &joined) };
        Self {
            saved,
            _guard: guard,
        }
    }
}

impl Drop for PathPrepend {
    fn drop(&mut self) {
        unsafe { std::env::set_var("PATH", &self.saved) };
    }
}

#[cfg(unix)]
pub fn write_script(dir: &Path, name: &str, body: &str) -> PathBuf {
    use std::os::unix::fs::PermissionsExt;
    let path = dir.join(name);
    std::fs::write(&path, body).expect("write fake tool script");
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755))
        .expect("mark fake tool script executable");
    path
}
