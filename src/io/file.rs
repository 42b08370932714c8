use std::path::Path;

use crate::error::LoadError;
use crate::model::TaskBoard;

/// Save a board to a JSON file.
pub fn save_board(board: &TaskBoard, path: &Path) -> Result<(), LoadError> {
    let json = serde_json::to_string_pretty(board)?;
    let io_err = |source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(io_err)?;
    }
    std::fs::write(path, json).map_err(io_err)
}

/// Load a board from a JSON file.
pub fn load_board(path: &Path) -> Result<TaskBoard, LoadError> {
    let json = std::fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&json).map_err(|source| LoadError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// The board at `path`, or `fallback()` when it is missing or unreadable.
pub fn load_board_or(path: &Path, fallback: impl FnOnce() -> TaskBoard) -> TaskBoard {
    if !path.exists() {
        tracing::info!(path = %path.display(), "no task file, using sample data");
        return fallback();
    }
    match load_board(path) {
        Ok(board) => {
            tracing::info!(
                path = %path.display(),
                projects = board.projects.len(),
                tasks = board.tasks.len(),
                "tasks loaded"
            );
            board
        }
        Err(err) => {
            tracing::warn!(%err, "falling back to sample data");
            fallback()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn board_survives_disk() {
        let today = NaiveDate::from_ymd_opt(2024, 2, 29).unwrap();
        let board = TaskBoard::sample(today);
        let path = std::env::temp_dir().join(format!("board-{}.json", uuid::Uuid::new_v4()));
        save_board(&board, &path).unwrap();
        assert_eq!(load_board(&path).unwrap(), board);
        std::fs::remove_file(&path).unwrap();

        let loaded = load_board_or(&path, TaskBoard::default);
        assert!(loaded.tasks.is_empty());
    }

    #[test]
    fn malformed_file_falls_back() {
        let path = std::env::temp_dir().join(format!("board-{}.json", uuid::Uuid::new_v4()));
        std::fs::write(&path, "[1, 2").unwrap();
        assert!(matches!(load_board(&path), Err(LoadError::Parse { .. })));
        let loaded = load_board_or(&path, || TaskBoard::sample(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()));
        assert_eq!(loaded.projects.len(), 3);
        std::fs::remove_file(&path).unwrap();
    }
}
