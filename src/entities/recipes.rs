use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "recipes")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub author_id: i32,

    pub title: String,

    #[sea_orm(unique)]
    pub slug: String,

    pub description: String,

    pub preparation_time: i32,

    pub preparation_time_unit: String,

    pub servings: i32,

    pub servings_unit: String,

    pub preparation_steps: String,

    /// Always false for author-saved recipes; flipping it is an
    /// administrative action outside the dashboard.
    pub preparation_step_is_html: bool,

    /// Draft flag. Authors only ever see and edit unpublished rows.
    pub is_published: bool,

    pub cover_path: Option<String>,

    pub created_at: String,

    pub updated_at: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::authors::Entity",
        from = "Column::AuthorId",
        to = "super::authors::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Authors,
}

impl Related<super::authors::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Authors.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
