//! Test for logging is isolated in its own module to avoid messing with the global settings of
//! other, non-logging related tests.
use log::Level;
use lite_cursor::{Cursor, Statement, handles::MemoryStatement};

#[test]
fn warn_if_advancing_abandons_staged_row() {
    // Given a cursor with a staged update
    let mut handle = MemoryStatement::new("SELECT id, name FROM people", ["id", "name"]);
    handle.push_row([Some("1"), Some("Alice")]);
    handle.push_row([Some("2"), Some("Bob")]);
    let mut cursor = Cursor::new(Statement::new(handle));
    cursor.open().unwrap();
    cursor.next().unwrap();
    cursor.update_value("name", "Carol").unwrap();

    testing_logger::setup();

    // When advancing without flushing the update
    cursor.next().unwrap();

    // Exactly one warning is emitted
    testing_logger::validate(|captured_logs| {
        let warnings: Vec<_> = captured_logs
            .iter()
            .filter(|log| log.level == Level::Warn)
            .collect();
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].body.contains("staged row"));
    });
}
