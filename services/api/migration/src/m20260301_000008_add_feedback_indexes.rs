use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Nested list endpoints filter by parent and sort by publication date.
        manager
            .create_index(
                Index::create()
                    .name("idx_reviews_title_pub_date")
                    .table(Reviews::Table)
                    .col(Reviews::TitleId)
                    .col(Reviews::PubDate)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_comments_review_pub_date")
                    .table(Comments::Table)
                    .col(Comments::ReviewId)
                    .col(Comments::PubDate)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(
                Index::drop()
                    .name("idx_comments_review_pub_date")
                    .table(Comments::Table)
                    .to_owned(),
            )
            .await?;
        manager
            .drop_index(
                Index::drop()
                    .name("idx_reviews_title_pub_date")
                    .table(Reviews::Table)
                    .to_owned(),
            )
            .await
    }
}

#[derive(Iden)]
enum Reviews {
    Table,
    TitleId,
    PubDate,
}

#[derive(Iden)]
enum Comments {
    Table,
    ReviewId,
    PubDate,
}
