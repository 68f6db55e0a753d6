use petstore_core::db::schema::{current_user_version, DATABASE_FILE_NAME, TABLE_NAME};
use petstore_core::db::{
    ensure_schema, open_db, open_db_in_memory, open_db_with_version, upgrade, DbError,
    DATABASE_VERSION,
};
use petstore_core::{
    PetAddress, PetProvider, PetQuery, PetRepository, PetValues, SqlitePetRepository,
};
use rusqlite::Connection;

#[test]
fn open_db_in_memory_creates_pets_table() {
    let conn = open_db_in_memory().unwrap();

    assert_eq!(current_user_version(&conn).unwrap(), DATABASE_VERSION);
    assert_table_exists(&conn, TABLE_NAME);
}

#[test]
fn pets_table_applies_column_defaults() {
    let conn = open_db_in_memory().unwrap();
    conn.execute("INSERT INTO pets (name, gender) VALUES ('Rex', 1);", [])
        .unwrap();

    let (breed, weight): (Option<String>, i64) = conn
        .query_row("SELECT breed, weight FROM pets;", [], |row| {
            Ok((row.get(0)?, row.get(1)?))
        })
        .unwrap();
    assert_eq!(breed, None);
    assert_eq!(weight, 0);
}

#[test]
fn opening_same_database_twice_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join(DATABASE_FILE_NAME);

    let conn_first = open_db(&path).unwrap();
    insert_pet(&conn_first, "Bella");
    drop(conn_first);

    let conn_second = open_db(&path).unwrap();
    assert_eq!(current_user_version(&conn_second).unwrap(), DATABASE_VERSION);
    assert_eq!(count_pets(&conn_second), 1);
}

#[test]
fn ensure_schema_is_noop_on_initialized_database() {
    let mut conn = open_db_in_memory().unwrap();
    insert_pet(&conn, "Milo");

    ensure_schema(&mut conn).unwrap();
    ensure_schema(&mut conn).unwrap();

    assert_eq!(count_pets(&conn), 1);
}

#[test]
fn opening_database_with_newer_schema_version_returns_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("future.db");

    let conn = Connection::open(&path).unwrap();
    conn.execute_batch("PRAGMA user_version = 999;").unwrap();
    drop(conn);

    let err = open_db(&path).unwrap_err();
    match err {
        DbError::UnsupportedSchemaVersion {
            db_version,
            latest_supported,
        } => {
            assert_eq!(db_version, 999);
            assert_eq!(latest_supported, DATABASE_VERSION);
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn version_bump_on_open_drops_existing_rows() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join(DATABASE_FILE_NAME);

    let conn = open_db(&path).unwrap();
    insert_pet(&conn, "Toto");
    insert_pet(&conn, "Luna");
    drop(conn);

    let bumped = DATABASE_VERSION + 1;
    let conn = open_db_with_version(&path, bumped).unwrap();
    assert_eq!(current_user_version(&conn).unwrap(), bumped);
    assert_table_exists(&conn, TABLE_NAME);
    assert_eq!(count_pets(&conn), 0);
}

#[test]
fn upgrade_leaves_collection_empty() {
    let mut conn = open_db_in_memory().unwrap();
    insert_pet(&conn, "Toto");

    upgrade(&mut conn, DATABASE_VERSION, DATABASE_VERSION + 1).unwrap();

    let repo = SqlitePetRepository::try_new(&conn).unwrap();
    let provider = PetProvider::new(repo);
    let mut cursor = provider
        .query(&PetAddress::Collection, &PetQuery::all())
        .unwrap();
    assert!(cursor.collect_rows().unwrap().is_empty());
    assert_eq!(current_user_version(&conn).unwrap(), DATABASE_VERSION + 1);
}

#[test]
fn upgrade_rejects_downgrade() {
    let mut conn = open_db_with_version_in_memory(3);

    let err = upgrade(&mut conn, 3, 2).unwrap_err();
    assert!(matches!(
        err,
        DbError::UnsupportedSchemaVersion {
            db_version: 3,
            latest_supported: 2
        }
    ));
    assert_eq!(current_user_version(&conn).unwrap(), 3);
}

fn open_db_with_version_in_memory(version: u32) -> Connection {
    let mut conn = Connection::open_in_memory().unwrap();
    petstore_core::db::ensure_schema_version(&mut conn, version).unwrap();
    conn
}

fn insert_pet(conn: &Connection, name: &str) {
    let repo = SqlitePetRepository::try_new(conn).unwrap();
    repo.insert(&PetValues::new().name(name).gender(0)).unwrap();
}

fn count_pets(conn: &Connection) -> i64 {
    conn.query_row("SELECT COUNT(*) FROM pets;", [], |row| row.get(0))
        .unwrap()
}

fn assert_table_exists(conn: &Connection, table_name: &str) {
    let exists: i64 = conn
        .query_row(
            "SELECT EXISTS(
                SELECT 1
                FROM sqlite_master
                WHERE type = 'table' AND name = ?1
            );",
            [table_name],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(exists, 1, "table {table_name} does not exist");
}
