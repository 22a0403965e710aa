use movieapp_core::db::{open_db, open_db_in_memory, DbError};
use movieapp_core::{
    MovieDetail, MovieRepository, MovieService, MovieValidationError, PersonRepository,
    PersonSimple, RepoError, ServiceError, SqliteMovieRepository, SqlitePersonRepository,
};
use rusqlite::{Connection, ErrorCode, TransactionBehavior};
use std::time::Duration;

fn add_person(conn: &Connection, name: &str) -> i64 {
    SqlitePersonRepository::try_new(conn)
        .unwrap()
        .insert_person(name)
        .unwrap()
        .id
}

fn actor_link_count(conn: &Connection, movie_id: i64) -> i64 {
    conn.query_row(
        "SELECT COUNT(*) FROM movie_actor WHERE movie_id = ?1;",
        [movie_id],
        |row| row.get(0),
    )
    .unwrap()
}

fn person_count(conn: &Connection) -> i64 {
    conn.query_row("SELECT COUNT(*) FROM person;", [], |row| row.get(0))
        .unwrap()
}

#[test]
fn add_echoes_generated_id() {
    let mut conn = open_db_in_memory().unwrap();
    let mut service = MovieService::new(SqliteMovieRepository::try_new(&mut conn).unwrap());

    let created = service
        .add(&MovieDetail::input("Up", 2009, Some(96)))
        .unwrap();
    let id = created.id.unwrap();
    assert_eq!(created.title, "Up");
    assert_eq!(created.year, 2009);
    assert_eq!(created.duration, Some(96));

    let stored = service.get_by_id(id).unwrap().unwrap();
    assert_eq!(stored.title, "Up");
    assert_eq!(stored.director, None);
    assert!(stored.actors.is_empty());
}

#[test]
fn add_ignores_caller_supplied_id() {
    let mut conn = open_db_in_memory().unwrap();
    let mut service = MovieService::new(SqliteMovieRepository::try_new(&mut conn).unwrap());

    let mut input = MovieDetail::input("Her", 2013, None);
    input.id = Some(42);
    let created = service.add(&input).unwrap();

    assert_ne!(created.id, Some(42));
    assert_eq!(created.duration, None);
}

#[test]
fn add_rejects_invalid_input_without_writing() {
    let mut conn = open_db_in_memory().unwrap();
    {
        let mut service =
            MovieService::new(SqliteMovieRepository::try_new(&mut conn).unwrap());

        let blank = service.add(&MovieDetail::input("  ", 2009, None)).unwrap_err();
        assert!(matches!(
            blank,
            ServiceError::InvalidMovie(MovieValidationError::BlankTitle)
        ));

        let negative = service
            .add(&MovieDetail::input("Up", 2009, Some(-1)))
            .unwrap_err();
        assert!(matches!(
            negative,
            ServiceError::InvalidMovie(MovieValidationError::NegativeDuration(-1))
        ));

        assert!(service.get_all().unwrap().is_empty());
    }
}

#[test]
fn update_overwrites_scalars_and_keeps_relations() {
    let mut conn = open_db_in_memory().unwrap();
    let director = add_person(&conn, "Pete Docter");
    let actor = add_person(&conn, "Ed Asner");
    let mut service = MovieService::new(SqliteMovieRepository::try_new(&mut conn).unwrap());

    let id = service
        .add(&MovieDetail::input("Upp", 2008, None))
        .unwrap()
        .id
        .unwrap();
    service.set_director(id, director).unwrap().unwrap();
    service.set_actors(id, &[actor]).unwrap().unwrap();

    let updated = service
        .update(id, &MovieDetail::input("Up", 2009, Some(96)))
        .unwrap()
        .unwrap();
    assert_eq!(updated.id, Some(id));
    assert_eq!(updated.title, "Up");
    assert_eq!(updated.year, 2009);
    assert_eq!(updated.duration, Some(96));

    let stored = service.get_by_id(id).unwrap().unwrap();
    assert_eq!(stored.title, "Up");
    assert_eq!(stored.director.unwrap().id, director);
    assert_eq!(
        stored.actors,
        vec![PersonSimple {
            id: actor,
            name: "Ed Asner".to_string()
        }]
    );
}

#[test]
fn update_can_clear_duration() {
    let mut conn = open_db_in_memory().unwrap();
    let mut service = MovieService::new(SqliteMovieRepository::try_new(&mut conn).unwrap());

    let id = service
        .add(&MovieDetail::input("Up", 2009, Some(96)))
        .unwrap()
        .id
        .unwrap();
    let updated = service
        .update(id, &MovieDetail::input("Up", 2009, None))
        .unwrap()
        .unwrap();

    assert_eq!(updated.duration, None);
    assert_eq!(service.get_without_duration().unwrap().len(), 1);
}

#[test]
fn update_of_unknown_movie_is_not_found_and_writes_nothing() {
    let mut conn = open_db_in_memory().unwrap();
    let mut service = MovieService::new(SqliteMovieRepository::try_new(&mut conn).unwrap());
    service.add(&MovieDetail::input("Up", 2009, Some(96))).unwrap();

    let result = service
        .update(999, &MovieDetail::input("Ghost", 2000, None))
        .unwrap();
    assert_eq!(result, None);

    let all = service.get_all().unwrap();
    assert_eq!(all.len(), 1);
    assert_eq!(all[0].title, "Up");
}

#[test]
fn update_of_unknown_movie_with_invalid_input_is_not_found() {
    let mut conn = open_db_in_memory().unwrap();
    let mut service = MovieService::new(SqliteMovieRepository::try_new(&mut conn).unwrap());

    let blank = service.update(999, &MovieDetail::input("", 2009, None)).unwrap();
    assert_eq!(blank, None);
    let negative = service
        .update(999, &MovieDetail::input("Ghost", 2000, Some(-5)))
        .unwrap();
    assert_eq!(negative, None);
    assert!(service.get_all().unwrap().is_empty());
}

#[test]
fn update_rejects_invalid_input_and_keeps_stored_row() {
    let mut conn = open_db_in_memory().unwrap();
    let mut service = MovieService::new(SqliteMovieRepository::try_new(&mut conn).unwrap());
    let id = service
        .add(&MovieDetail::input("Up", 2009, Some(96)))
        .unwrap()
        .id
        .unwrap();

    let err = service
        .update(id, &MovieDetail::input("", 2009, None))
        .unwrap_err();
    assert!(matches!(err, ServiceError::InvalidMovie(_)));
    assert_eq!(service.get_by_id(id).unwrap().unwrap().title, "Up");
}

#[test]
fn set_director_links_existing_person() {
    let mut conn = open_db_in_memory().unwrap();
    let director = add_person(&conn, "Clint Eastwood");
    let mut service = MovieService::new(SqliteMovieRepository::try_new(&mut conn).unwrap());
    let id = service
        .add(&MovieDetail::input("Gran Torino", 2008, Some(116)))
        .unwrap()
        .id
        .unwrap();

    let detail = service.set_director(id, director).unwrap().unwrap();
    assert_eq!(detail.id, id);
    assert_eq!(
        detail.director,
        Some(PersonSimple {
            id: director,
            name: "Clint Eastwood".to_string()
        })
    );
    assert_eq!(
        service.get_by_director_name("Clint Eastwood").unwrap().len(),
        1
    );
}

#[test]
fn set_director_with_unknown_movie_or_person_is_not_found() {
    let mut conn = open_db_in_memory().unwrap();
    let director = add_person(&conn, "Clint Eastwood");
    let mut service = MovieService::new(SqliteMovieRepository::try_new(&mut conn).unwrap());
    let id = service
        .add(&MovieDetail::input("Gran Torino", 2008, Some(116)))
        .unwrap()
        .id
        .unwrap();

    assert_eq!(service.set_director(999, director).unwrap(), None);
    assert_eq!(service.set_director(id, 999).unwrap(), None);
    assert_eq!(service.get_by_id(id).unwrap().unwrap().director, None);
}

#[test]
fn clear_director_unlinks_but_keeps_person() {
    let mut conn = open_db_in_memory().unwrap();
    let director = add_person(&conn, "Clint Eastwood");
    {
        let mut service =
            MovieService::new(SqliteMovieRepository::try_new(&mut conn).unwrap());
        let id = service
            .add(&MovieDetail::input("Gran Torino", 2008, Some(116)))
            .unwrap()
            .id
            .unwrap();
        service.set_director(id, director).unwrap().unwrap();

        let cleared = service.clear_director(id).unwrap().unwrap();
        assert_eq!(cleared.director, None);
        assert_eq!(service.clear_director(999).unwrap(), None);
    }
    assert_eq!(person_count(&conn), 1);
}

#[test]
fn set_actors_replaces_whole_set_and_is_idempotent() {
    let mut conn = open_db_in_memory().unwrap();
    let eastwood = add_person(&conn, "Clint Eastwood");
    let freeman = add_person(&conn, "Morgan Freeman");
    let swank = add_person(&conn, "Hilary Swank");
    let mut service = MovieService::new(SqliteMovieRepository::try_new(&mut conn).unwrap());
    let id = service
        .add(&MovieDetail::input("Million Dollar Baby", 2004, Some(132)))
        .unwrap()
        .id
        .unwrap();

    service.set_actors(id, &[eastwood, freeman]).unwrap().unwrap();
    let first = service.set_actors(id, &[freeman, swank]).unwrap().unwrap();
    let names: Vec<&str> = first.actors.iter().map(|actor| actor.name.as_str()).collect();
    assert_eq!(names, vec!["Hilary Swank", "Morgan Freeman"]);

    let again = service.set_actors(id, &[freeman, swank]).unwrap().unwrap();
    assert_eq!(again, first);
}

#[test]
fn set_actors_with_unknown_person_fails_and_keeps_current_set() {
    let mut conn = open_db_in_memory().unwrap();
    let freeman = add_person(&conn, "Morgan Freeman");
    let swank = add_person(&conn, "Hilary Swank");
    let id;
    {
        let mut service =
            MovieService::new(SqliteMovieRepository::try_new(&mut conn).unwrap());
        id = service
            .add(&MovieDetail::input("Million Dollar Baby", 2004, Some(132)))
            .unwrap()
            .id
            .unwrap();
        service.set_actors(id, &[freeman]).unwrap().unwrap();

        let err = service.set_actors(id, &[swank, 999]).unwrap_err();
        match err {
            ServiceError::UnresolvedActors { movie_id, missing } => {
                assert_eq!(movie_id, id);
                assert_eq!(missing, vec![999]);
            }
            other => panic!("unexpected error: {other}"),
        }

        let actors = service.get_by_id(id).unwrap().unwrap().actors;
        assert_eq!(actors.len(), 1);
        assert_eq!(actors[0].id, freeman);
    }
    assert_eq!(actor_link_count(&conn, id), 1);
}

#[test]
fn set_actors_on_unknown_movie_is_not_found() {
    let mut conn = open_db_in_memory().unwrap();
    let freeman = add_person(&conn, "Morgan Freeman");
    let mut service = MovieService::new(SqliteMovieRepository::try_new(&mut conn).unwrap());

    assert_eq!(service.set_actors(999, &[freeman]).unwrap(), None);
}

#[test]
fn set_actors_with_repeated_id_fails_and_keeps_current_set() {
    let mut conn = open_db_in_memory().unwrap();
    let freeman = add_person(&conn, "Morgan Freeman");
    let damon = add_person(&conn, "Matt Damon");
    let id;
    {
        let mut service =
            MovieService::new(SqliteMovieRepository::try_new(&mut conn).unwrap());
        id = service
            .add(&MovieDetail::input("Invictus", 2009, None))
            .unwrap()
            .id
            .unwrap();
        service.set_actors(id, &[damon]).unwrap().unwrap();

        let err = service
            .set_actors(id, &[freeman, damon, freeman])
            .unwrap_err();
        match err {
            ServiceError::DuplicateActors {
                movie_id,
                duplicates,
            } => {
                assert_eq!(movie_id, id);
                assert_eq!(duplicates, vec![freeman]);
            }
            other => panic!("unexpected error: {other}"),
        }

        let actors = service.get_by_id(id).unwrap().unwrap().actors;
        assert_eq!(actors.len(), 1);
        assert_eq!(actors[0].id, damon);
    }
    assert_eq!(actor_link_count(&conn, id), 1);
}

#[test]
fn set_actors_reports_every_unknown_id_in_long_lists() {
    let mut conn = open_db_in_memory().unwrap();
    let freeman = add_person(&conn, "Morgan Freeman");
    let damon = add_person(&conn, "Matt Damon");
    let mut repo = SqliteMovieRepository::try_new(&mut conn).unwrap();
    let movie = repo
        .insert_movie(&movieapp_core::NewMovie::new("Invictus", 2009, None))
        .unwrap();

    let requested: Vec<i64> = (1..40_000).collect();
    let err = repo.set_actors(movie.id, &requested).unwrap_err();
    match err {
        RepoError::UnresolvedActors { missing, .. } => {
            assert_eq!(missing.len(), requested.len() - 2);
            assert!(!missing.contains(&freeman));
            assert!(!missing.contains(&damon));
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(repo
        .find_with_relations(movie.id)
        .unwrap()
        .unwrap()
        .actors
        .is_empty());
}

#[test]
fn set_actors_with_empty_list_clears_actors() {
    let mut conn = open_db_in_memory().unwrap();
    let freeman = add_person(&conn, "Morgan Freeman");
    let mut service = MovieService::new(SqliteMovieRepository::try_new(&mut conn).unwrap());
    let id = service
        .add(&MovieDetail::input("Invictus", 2009, None))
        .unwrap()
        .id
        .unwrap();
    service.set_actors(id, &[freeman]).unwrap().unwrap();

    let cleared = service.set_actors(id, &[]).unwrap().unwrap();
    assert!(cleared.actors.is_empty());
    assert!(service.get_by_actor_name("Morgan Freeman").unwrap().is_empty());
}

#[test]
fn delete_removes_movie_and_links_but_keeps_persons() {
    let mut conn = open_db_in_memory().unwrap();
    let eastwood = add_person(&conn, "Clint Eastwood");
    let vang = add_person(&conn, "Bee Vang");
    let id;
    {
        let mut service =
            MovieService::new(SqliteMovieRepository::try_new(&mut conn).unwrap());
        id = service
            .add(&MovieDetail::input("Gran Torino", 2008, Some(116)))
            .unwrap()
            .id
            .unwrap();
        service.set_director(id, eastwood).unwrap().unwrap();
        service.set_actors(id, &[eastwood, vang]).unwrap().unwrap();

        let deleted = service.delete_movie_by_id(id).unwrap().unwrap();
        assert_eq!(deleted.id, Some(id));
        assert_eq!(deleted.title, "Gran Torino");

        assert_eq!(service.get_by_id(id).unwrap(), None);
        assert_eq!(service.delete_movie_by_id(id).unwrap(), None);
    }

    assert_eq!(actor_link_count(&conn, id), 0);
    assert_eq!(person_count(&conn), 2);

    let persons = SqlitePersonRepository::try_new(&conn).unwrap();
    assert!(persons.directed_movies(eastwood).unwrap().is_empty());
    assert!(persons.acted_movies(vang).unwrap().is_empty());
}

#[test]
fn repository_write_errors_surface_through_trait() {
    let mut conn = open_db_in_memory().unwrap();
    let mut repo = SqliteMovieRepository::try_new(&mut conn).unwrap();
    let movie = repo
        .insert_movie(&movieapp_core::NewMovie::new("Up", 2009, Some(96)))
        .unwrap();

    let err = repo.set_actors(movie.id, &[7, 8]).unwrap_err();
    assert!(matches!(
        err,
        RepoError::UnresolvedActors { ref missing, .. } if missing == &vec![7, 8]
    ));
}

#[test]
fn immediate_write_transaction_blocks_second_writer() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("movieapp.db");
    let mut holder = open_db(&path).unwrap();
    let mut writer = open_db(&path).unwrap();
    writer.busy_timeout(Duration::from_millis(50)).unwrap();

    let id = SqliteMovieRepository::try_new(&mut holder)
        .unwrap()
        .insert_movie(&movieapp_core::NewMovie::new("Up", 2009, Some(96)))
        .unwrap()
        .id;

    {
        let tx = holder
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .unwrap();
        let mut repo = SqliteMovieRepository::try_new(&mut writer).unwrap();
        let err = repo
            .update_movie(id, &movieapp_core::NewMovie::new("Upp", 2009, Some(96)))
            .unwrap_err();
        assert!(matches!(
            err,
            RepoError::Db(DbError::Sqlite(ref sqlite))
                if sqlite.sqlite_error_code() == Some(ErrorCode::DatabaseBusy)
        ));
        drop(tx);
    }

    let mut repo = SqliteMovieRepository::try_new(&mut writer).unwrap();
    let updated = repo
        .update_movie(id, &movieapp_core::NewMovie::new("Upp", 2009, Some(96)))
        .unwrap()
        .unwrap();
    assert_eq!(updated.title, "Upp");
}

#[test]
fn waiting_writer_proceeds_after_holder_commits() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("movieapp.db");
    let mut holder = open_db(&path).unwrap();

    let id = SqliteMovieRepository::try_new(&mut holder)
        .unwrap()
        .insert_movie(&movieapp_core::NewMovie::new("Up", 2009, Some(96)))
        .unwrap()
        .id;

    let tx = holder
        .transaction_with_behavior(TransactionBehavior::Immediate)
        .unwrap();
    tx.execute("UPDATE movie SET duration = 100 WHERE id = ?1;", [id])
        .unwrap();

    let writer_path = path.clone();
    let waiting = std::thread::spawn(move || {
        let mut writer = open_db(&writer_path).unwrap();
        let mut repo = SqliteMovieRepository::try_new(&mut writer).unwrap();
        repo.update_movie(id, &movieapp_core::NewMovie::new("Up", 2009, Some(96)))
            .unwrap()
            .unwrap()
    });

    std::thread::sleep(Duration::from_millis(100));
    tx.commit().unwrap();

    let updated = waiting.join().unwrap();
    assert_eq!(updated.duration, Some(96));
}
