use movieapp_core::db::open_db_in_memory;
use movieapp_core::{
    MovieDetail, MovieService, PersonRepository, SqliteMovieRepository, SqlitePersonRepository,
};
use serde_json::json;

#[test]
fn movie_detail_input_deserializes_without_id_or_duration() {
    let detail: MovieDetail =
        serde_json::from_value(json!({ "title": "Up", "year": 2009 })).unwrap();

    assert_eq!(detail, MovieDetail::input("Up", 2009, None));
}

#[test]
fn listing_shape_serializes_scalars_only() {
    let mut conn = open_db_in_memory().unwrap();
    let mut service = MovieService::new(SqliteMovieRepository::try_new(&mut conn).unwrap());
    let id = service
        .add(&MovieDetail::input("Her", 2013, None))
        .unwrap()
        .id
        .unwrap();

    let listing = serde_json::to_value(service.get_all().unwrap()).unwrap();
    assert_eq!(
        listing,
        json!([{ "id": id, "title": "Her", "year": 2013, "duration": null }])
    );
}

#[test]
fn detail_shape_embeds_summarized_director_and_actors() {
    let mut conn = open_db_in_memory().unwrap();
    let (eastwood, vang) = {
        let persons = SqlitePersonRepository::try_new(&conn).unwrap();
        (
            persons.insert_person("Clint Eastwood").unwrap().id,
            persons.insert_person("Bee Vang").unwrap().id,
        )
    };
    let mut service = MovieService::new(SqliteMovieRepository::try_new(&mut conn).unwrap());
    let id = service
        .add(&MovieDetail::input("Gran Torino", 2008, Some(116)))
        .unwrap()
        .id
        .unwrap();
    service.set_director(id, eastwood).unwrap().unwrap();
    service.set_actors(id, &[eastwood, vang]).unwrap().unwrap();

    let detail = serde_json::to_value(service.get_by_id(id).unwrap().unwrap()).unwrap();
    assert_eq!(
        detail,
        json!({
            "id": id,
            "title": "Gran Torino",
            "year": 2008,
            "duration": 116,
            "director": { "id": eastwood, "name": "Clint Eastwood" },
            "actors": [
                { "id": vang, "name": "Bee Vang" },
                { "id": eastwood, "name": "Clint Eastwood" }
            ]
        })
    );
}

#[test]
fn detail_shape_without_relations_uses_null_and_empty_list() {
    let mut conn = open_db_in_memory().unwrap();
    let mut service = MovieService::new(SqliteMovieRepository::try_new(&mut conn).unwrap());
    let id = service
        .add(&MovieDetail::input("Up", 2009, Some(96)))
        .unwrap()
        .id
        .unwrap();

    let detail = serde_json::to_value(service.get_by_id(id).unwrap().unwrap()).unwrap();
    assert_eq!(detail["director"], json!(null));
    assert_eq!(detail["actors"], json!([]));
}
