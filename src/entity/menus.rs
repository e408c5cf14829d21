use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "menus")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub price: i64,
    pub image_url: String,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::restaurant_menus::Entity")]
    RestaurantMenus,
}

impl Related<super::restaurant_menus::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::RestaurantMenus.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
