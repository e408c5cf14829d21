use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: Uuid,
    pub fullname: String,
    pub email: String,
    pub password_hash: String,
    pub contact: i64,
    pub address: String,
    pub city: String,
    pub profile_picture: String,
    pub role: String,
    pub is_verified: bool,
    pub last_login: Option<DateTimeWithTimeZone>,
    pub verification_token: Option<String>,
    pub verification_token_expires_at: Option<DateTimeWithTimeZone>,
    pub reset_password_token: Option<String>,
    pub reset_password_token_expires_at: Option<DateTimeWithTimeZone>,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::restaurants::Entity")]
    Restaurants,
    #[sea_orm(has_many = "super::orders::Entity")]
    Orders,
}

impl Related<super::restaurants::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Restaurants.def()
    }
}

impl Related<super::orders::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Orders.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
