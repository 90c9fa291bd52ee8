//! Shared test schemas: users with a nested role, their locations, the
//! matching view models and a composite user-with-locations view.
use crate::{
    db::{MemoryContext, MemoryRepository},
    expr::Lambda,
    mapping::{Mapping, MappingSet},
    service::GenericService,
};

record! {
    pub(crate) struct Role as "Role" {
        id: i64,
        name: Option<String>,
    }
}

record! {
    pub(crate) struct User as "User" {
        id: i64,
        name: Option<String>,
        age: Option<i64>;
        records { role: Role }
    }
}

record! {
    pub(crate) struct Location as "Location" {
        id: i64,
        name: Option<String>,
        user_id: i64,
    }
}

record! {
    pub(crate) struct UserModel as "UserModel" {
        id: Option<i64>,
        name: Option<String>,
        role: Option<String>,
        age: Option<i64>,
    }
}

record! {
    pub(crate) struct LocationModel as "LocationModel" {
        id: Option<i64>,
        name: Option<String>,
    }
}

record! {
    pub(crate) struct UserLocationsModel as "UserLocationsModel" {
        ;
        records { user: UserModel }
        ; lists { locations: LocationModel }
    }
}

///
/// UserLocations
/// Join row produced by the user/location aggregate.
///

#[derive(Clone, Debug, Default)]
pub(crate) struct UserLocations {
    pub(crate) user: User,
    pub(crate) locations: Vec<Location>,
}

pub(crate) fn user(id: i64, name: &str, role: &str) -> User {
    User {
        id,
        name: Some(name.to_string()),
        age: None,
        role: Some(Role {
            id,
            name: Some(role.to_string()),
        }),
    }
}

pub(crate) fn location(id: i64, name: &str, user_id: i64) -> Location {
    Location {
        id,
        name: Some(name.to_string()),
        user_id,
    }
}

pub(crate) fn user_mappings() -> MappingSet {
    let mut set = MappingSet::new();
    for mapping in [
        Mapping::init::<UserModel, User>(|m| m.field("id"), |e| e.field("id"))
            .map(Mapping::primary_key),
        Mapping::init::<UserModel, User>(|m| m.field("name"), |e| e.field("name")),
        Mapping::init::<UserModel, User>(|m| m.field("role"), |e| e.path("role.name")),
        Mapping::init::<UserModel, User>(|m| m.field("age"), |e| e.field("age")),
    ] {
        set.push(mapping.unwrap()).unwrap();
    }
    set
}

pub(crate) fn location_mappings() -> MappingSet {
    let mut set = MappingSet::new();
    for mapping in [
        Mapping::init::<LocationModel, Location>(|m| m.field("id"), |e| e.field("id"))
            .map(Mapping::primary_key),
        Mapping::init::<LocationModel, Location>(|m| m.field("name"), |e| e.field("name")),
    ] {
        set.push(mapping.unwrap()).unwrap();
    }
    set
}

/// `|x| x.id == id` over `UserModel`.
pub(crate) fn user_model_id_eq(id: i64) -> Lambda {
    Lambda::of::<UserModel>(|x| x.field("id").eq(id))
}

/// Users 1..=3 and locations PARIS (user 1), MADRID (user 2), LONDON (user 1).
pub(crate) fn seeded_context() -> MemoryContext {
    let context = MemoryContext::new();

    let users = MemoryRepository::new().with_identity("id");
    users
        .seed([
            user(1, "NAME1", "ROLE1"),
            user(2, "NAME2", "ROLE2"),
            user(3, "NAME3", "ROLE1"),
        ])
        .unwrap();
    context.register(users).unwrap();

    let locations = MemoryRepository::new().with_identity("id");
    locations
        .seed([
            location(1, "PARIS", 1),
            location(2, "MADRID", 2),
            location(3, "LONDON", 1),
        ])
        .unwrap();
    context.register(locations).unwrap();

    context
}

pub(crate) fn user_service(context: &MemoryContext) -> GenericService<UserModel, User> {
    GenericService::builder()
        .key(|m| m.field("id"), |e| e.field("id"))
        .map(|m| m.field("name"), |e| e.field("name"))
        .map(|m| m.field("role"), |e| e.path("role.name"))
        .map(|m| m.field("age"), |e| e.field("age"))
        .default_order(|e| e.field("id"))
        .build(context)
        .unwrap()
}

pub(crate) fn location_service(
    context: &MemoryContext,
) -> GenericService<LocationModel, Location> {
    GenericService::builder()
        .key(|m| m.field("id"), |e| e.field("id"))
        .map(|m| m.field("name"), |e| e.field("name"))
        .default_order(|e| e.field("id"))
        .build(context)
        .unwrap()
}
