use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Ingredients::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Ingredients::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Ingredients::Title).string().not_null())
                    .col(ColumnDef::new(Ingredients::Calories).double().not_null())
                    .col(
                        ColumnDef::new(Ingredients::Carbohydrates)
                            .double()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Ingredients::Fat).double().not_null())
                    .col(ColumnDef::new(Ingredients::Protein).double().not_null())
                    .col(ColumnDef::new(Ingredients::WeightPerPiece).double().null())
                    .col(
                        ColumnDef::new(Ingredients::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Ingredients::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
pub(crate) enum Ingredients {
    Table,
    Id,
    Title,
    Calories,
    Carbohydrates,
    Fat,
    Protein,
    WeightPerPiece,
    CreatedAt,
}
