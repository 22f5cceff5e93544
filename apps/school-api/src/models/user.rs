use diesel::prelude::*;
use school_common::UserKind;
use serde::Serialize;
use utoipa::ToSchema;

use crate::db::schema::users;

/// A platform user, as far as the chat needs to know about one.
#[derive(Debug, Clone, Queryable, Selectable, Serialize, ToSchema)]
#[diesel(table_name = users)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: i64,
    pub email: String,
    pub firstname: String,
    pub lastname: String,
    pub user_kind: i16,
    pub school_id: Option<i64>,
}

impl User {
    pub fn kind(&self) -> Option<UserKind> {
        UserKind::try_from(self.user_kind).ok()
    }
}
