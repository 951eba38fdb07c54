use async_graphql::{ComplexObject, Context, Enum, InputObject, SimpleObject};
use rust_decimal::Decimal;

use super::{services, tenant, GraphqlResultExt};
use crate::config::FilterConfig;
use crate::filter::{text_filter, CatalogItemQuery, FilterError, Pagination, ResourceQuery, SortDirection, SortSpec};
use crate::models::{CatalogItem, ItemStatus, ItemType, LinkedResource, Page, Resource, ResourceStatus, ResourceType};
use crate::string_enum;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Enum)]
pub enum SortOrder {
    Asc,
    Desc,
}

impl From<SortOrder> for SortDirection {
    fn from(order: SortOrder) -> Self {
        match order {
            SortOrder::Asc => SortDirection::Asc,
            SortOrder::Desc => SortDirection::Desc,
        }
    }
}

string_enum! {
    /// Sortable catalog item fields, `UNIT_PRICE` in GraphQL and `unit_price` internally
    pub enum CatalogItemSortField {
        Name => "name",
        UnitPrice => "unit_price",
        CreatedAt => "created_at",
        UpdatedAt => "updated_at",
        VersionNumber => "version_number",
        Status => "status",
        ItemType => "item_type",
        Category => "category",
        Sku => "sku",
    }
}

string_enum! {
    pub enum ResourceSortField {
        Name => "name",
        ResourceType => "resource_type",
        Status => "status",
        HourlyCost => "hourly_cost",
        Capacity => "capacity",
        CreatedAt => "created_at",
        UpdatedAt => "updated_at",
    }
}

#[derive(Debug, Clone, InputObject)]
pub struct CatalogItemSortInput {
    pub field: CatalogItemSortField,
    #[graphql(default_with = "SortOrder::Asc")]
    pub direction: SortOrder,
}

#[derive(Debug, Clone, InputObject)]
pub struct ResourceSortInput {
    pub field: ResourceSortField,
    #[graphql(default_with = "SortOrder::Asc")]
    pub direction: SortOrder,
}

#[derive(Debug, Clone, Default, InputObject)]
pub struct CatalogItemFilterInput {
    pub search: Option<String>,
    pub item_type: Option<ItemType>,
    pub status: Option<ItemStatus>,
    pub category: Option<String>,
    pub min_price: Option<Decimal>,
    pub max_price: Option<Decimal>,
    pub include_inactive: Option<bool>,
}

#[derive(Debug, Clone, Default, InputObject)]
pub struct ResourceFilterInput {
    pub search: Option<String>,
    pub resource_type: Option<ResourceType>,
    pub status: Option<ResourceStatus>,
    pub include_inactive: Option<bool>,
}

impl CatalogItemFilterInput {
    pub fn into_query(
        self,
        sort: Vec<CatalogItemSortInput>,
        page: Option<i32>,
        per_page: Option<i32>,
        config: &FilterConfig,
    ) -> Result<CatalogItemQuery, FilterError> {
        let sort = sort
            .into_iter()
            .map(|s| SortSpec::new(s.field.as_str(), s.direction.into(), CatalogItemQuery::sortable()))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(CatalogItemQuery {
            search: text_filter(self.search),
            item_type: self.item_type,
            status: self.status,
            category: text_filter(self.category),
            min_price: self.min_price,
            max_price: self.max_price,
            include_inactive: self.include_inactive.unwrap_or(false),
            sort,
            pagination: Pagination::new(page.map(i64::from), per_page.map(i64::from), config)?,
        })
    }
}

impl ResourceFilterInput {
    pub fn into_query(
        self,
        sort: Vec<ResourceSortInput>,
        page: Option<i32>,
        per_page: Option<i32>,
        config: &FilterConfig,
    ) -> Result<ResourceQuery, FilterError> {
        let sort = sort
            .into_iter()
            .map(|s| SortSpec::new(s.field.as_str(), s.direction.into(), ResourceQuery::sortable()))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(ResourceQuery {
            search: text_filter(self.search),
            resource_type: self.resource_type,
            status: self.status,
            include_inactive: self.include_inactive.unwrap_or(false),
            sort,
            pagination: Pagination::new(page.map(i64::from), per_page.map(i64::from), config)?,
        })
    }
}

#[derive(Debug, Clone, SimpleObject)]
pub struct CatalogItemPage {
    pub items: Vec<CatalogItem>,
    pub total: i64,
    pub page: u32,
    pub per_page: u32,
    pub total_pages: u32,
}

#[derive(Debug, Clone, SimpleObject)]
pub struct ResourcePage {
    pub items: Vec<Resource>,
    pub total: i64,
    pub page: u32,
    pub per_page: u32,
    pub total_pages: u32,
}

impl From<Page<CatalogItem>> for CatalogItemPage {
    fn from(page: Page<CatalogItem>) -> Self {
        Self {
            items: page.items,
            total: page.total,
            page: page.page,
            per_page: page.per_page,
            total_pages: page.total_pages,
        }
    }
}

impl From<Page<Resource>> for ResourcePage {
    fn from(page: Page<Resource>) -> Self {
        Self {
            items: page.items,
            total: page.total,
            page: page.page,
            per_page: page.per_page,
            total_pages: page.total_pages,
        }
    }
}

#[ComplexObject]
impl CatalogItem {
    /// Resources linked to this version
    async fn resources(&self, ctx: &Context<'_>) -> async_graphql::Result<Vec<LinkedResource>> {
        let tenant = tenant(ctx)?;
        services(ctx)?.catalog.item_resources(tenant, self.id).await.extended()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use crate::naming::to_screaming_snake_case;
    use async_graphql::resolver_utils::EnumType;

    #[test]
    fn sort_field_names_translate_to_columns() {
        for item in CatalogItemSortField::items() {
            assert_eq!(item.name, to_screaming_snake_case(item.value.as_str()));
            assert!(CatalogItemQuery::sortable().contains(&item.value.as_str()));
        }
        for item in ResourceSortField::items() {
            assert!(ResourceQuery::sortable().contains(&item.value.as_str()));
        }
    }

    #[test]
    fn filter_input_builds_query() {
        let config = AppConfig::development().filter;
        let query = CatalogItemFilterInput { item_type: Some(ItemType::Service), ..Default::default() }
            .into_query(
                vec![CatalogItemSortInput { field: CatalogItemSortField::UnitPrice, direction: SortOrder::Desc }],
                Some(2),
                Some(10),
                &config,
            )
            .unwrap();
        assert_eq!(query.sort[0].field, "unit_price");
        assert_eq!(query.sort[0].direction, SortDirection::Desc);
        assert_eq!(query.pagination.offset(), 10);
        assert!(!query.include_inactive);

        let err = CatalogItemFilterInput::default().into_query(vec![], Some(0), None, &config);
        assert!(err.is_err());
    }

    #[test]
    fn text_filters_are_trimmed_like_query_strings() {
        let config = AppConfig::development().filter;
        let query = CatalogItemFilterInput {
            search: Some("  spa ".into()),
            category: Some(" wellness\t".into()),
            ..Default::default()
        }
        .into_query(vec![], None, None, &config)
        .unwrap();
        assert_eq!(query.search.as_deref(), Some("spa"));
        assert_eq!(query.category.as_deref(), Some("wellness"));

        let query = ResourceFilterInput { search: Some("   ".into()), ..Default::default() }
            .into_query(vec![], None, None, &config)
            .unwrap();
        assert_eq!(query.search, None);
    }
}
