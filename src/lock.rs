//! Advisory file locking
//!
//! A store holds an exclusive lock on `<data file>.lock` for its whole
//! lifetime. Acquisition goes through the [`Locker`] trait so callers can
//! swap the primitive; [`FlockLocker`] is the default.

use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// A held lock. Dropping it releases the lock.
pub type LockGuard = Box<dyn Send + Sync>;

/// Acquires the exclusive lock for a data file.
pub trait Locker: Send + Sync {
    /// Lock `lock_path`, failing immediately if another holder exists.
    fn lock(&self, lock_path: &Path) -> io::Result<LockGuard>;
}

impl<F> Locker for F
where
    F: Fn(&Path) -> io::Result<LockGuard> + Send + Sync,
{
    fn lock(&self, lock_path: &Path) -> io::Result<LockGuard> {
        self(lock_path)
    }
}

/// Path of the lock file guarding `data_path`
pub fn lock_path(data_path: &Path) -> PathBuf {
    let mut name = data_path.as_os_str().to_owned();
    name.push(".lock");
    PathBuf::from(name)
}

/// Default locker: `flock(2)` on unix
#[derive(Debug, Default, Clone, Copy)]
pub struct FlockLocker;

impl Locker for FlockLocker {
    fn lock(&self, lock_path: &Path) -> io::Result<LockGuard> {
        Ok(Box::new(FileLock::lock(lock_path)?))
    }
}

/// An exclusive lock on a file, released when dropped.
///
/// The lock file contains the holder's process ID for debugging.
#[derive(Debug)]
pub struct FileLock {
    _file: File,
    path: PathBuf,
}

impl FileLock {
    pub fn lock<P: AsRef<Path>>(path: P) -> io::Result<Self> {
        let path = path.as_ref().to_path_buf();

        // Don't truncate before we hold the lock: the file may belong to
        // a live holder.
        let mut file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(&path)?;

        Self::try_lock(&file)?;

        file.set_len(0)?;
        writeln!(file, "{}", std::process::id())?;
        file.flush()?;

        Ok(Self { _file: file, path })
    }

    #[cfg(unix)]
    fn try_lock(file: &File) -> io::Result<()> {
        use std::os::unix::io::AsRawFd;

        let fd = file.as_raw_fd();
        // SAFETY: fd is a valid open descriptor owned by `file`.
        let result = unsafe { libc::flock(fd, libc::LOCK_EX | libc::LOCK_NB) };
        if result != 0 {
            return Err(io::Error::last_os_error());
        }
        Ok(())
    }

    #[cfg(not(unix))]
    fn try_lock(_file: &File) -> io::Result<()> {
        // No advisory locking on this platform; exclusivity is best effort.
        Ok(())
    }

    /// Get the path of the lock file
    pub fn path(&self) -> &Path {
        &self.path
    }
}
