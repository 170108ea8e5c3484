// Copyright 2025 Kirky.X
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use crate::domain::models::agent::{Agent, AgentFilter, AgentStats, LocationCount, NewAgent};
use crate::domain::models::listing::{Listing, ListingCandidate};
use crate::domain::repositories::job_repository::RepositoryError;
use crate::domain::repositories::result_repository::{IdentityKey, ResultRepository};
use crate::infrastructure::database::entities::{agent as agent_entity, listing as listing_entity};
use async_trait::async_trait;
use chrono::Utc;
use sea_orm::{
    sea_query::{Expr, Func, OnConflict},
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, DbErr, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set,
};
use std::sync::Arc;
use uuid::Uuid;

/// 抓取结果仓库实现
///
/// 存储经纪人和房源。房源以 URL 为自然键，重复写入同一 URL 不会产生新记录。
#[derive(Clone)]
pub struct ResultRepositoryImpl {
    /// 数据库连接
    db: Arc<DatabaseConnection>,
}

impl ResultRepositoryImpl {
    /// 创建新的结果仓库实例
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    async fn find_agent(&self, id: Uuid) -> Result<agent_entity::Model, RepositoryError> {
        agent_entity::Entity::find_by_id(id)
            .one(self.db.as_ref())
            .await?
            .ok_or(RepositoryError::NotFound)
    }
}

fn property_types(value: &serde_json::Value) -> Result<Vec<String>, RepositoryError> {
    serde_json::from_value(value.clone())
        .map_err(|e| RepositoryError::InvalidData(format!("property_types: {}", e)))
}

impl TryFrom<agent_entity::Model> for Agent {
    type Error = RepositoryError;

    fn try_from(model: agent_entity::Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: model.id,
            property_types: property_types(&model.property_types)?,
            name: model.name,
            phone: model.phone,
            email: model.email,
            location: model.location,
            profile_url: model.profile_url,
            website: model.website,
            is_lead: model.is_lead,
            source: model.source,
            created_at: model.created_at.with_timezone(&Utc),
        })
    }
}

impl From<listing_entity::Model> for Listing {
    fn from(model: listing_entity::Model) -> Self {
        Self {
            id: model.id,
            agent_id: model.agent_id,
            title: model.title,
            price: model.price,
            location: model.location,
            property_type: model.property_type,
            bedrooms: model.bedrooms.and_then(|v| u32::try_from(v).ok()),
            bathrooms: model.bathrooms.and_then(|v| u32::try_from(v).ok()),
            url: model.url,
            image_url: model.image_url,
            created_at: model.created_at.with_timezone(&Utc),
        }
    }
}

fn count_to_db(value: Option<u32>) -> Option<i32> {
    value.and_then(|v| i32::try_from(v).ok())
}

#[async_trait]
impl ResultRepository for ResultRepositoryImpl {
    async fn find_agent_by_identity(
        &self,
        key: IdentityKey<'_>,
    ) -> Result<Option<Agent>, RepositoryError> {
        if key.is_empty() {
            return Ok(None);
        }

        let mut condition = Condition::any();
        if let Some(phone) = key.phone {
            condition = condition.add(agent_entity::Column::Phone.eq(phone));
        }
        if let Some(email) = key.email {
            condition = condition.add(agent_entity::Column::Email.eq(email));
        }
        if let Some(name) = key.name {
            condition = condition.add(agent_entity::Column::Name.eq(name));
        }

        agent_entity::Entity::find()
            .filter(condition)
            .order_by_asc(agent_entity::Column::CreatedAt)
            .order_by_asc(agent_entity::Column::Id)
            .one(self.db.as_ref())
            .await?
            .map(Agent::try_from)
            .transpose()
    }

    async fn create_agent(&self, agent: &NewAgent) -> Result<Agent, RepositoryError> {
        let model = agent_entity::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(agent.name.clone()),
            phone: Set(agent.phone.clone()),
            email: Set(agent.email.clone()),
            location: Set(agent.location.clone()),
            property_types: Set(serde_json::json!(agent.property_types)),
            profile_url: Set(agent.profile_url.clone()),
            website: Set(agent.website.clone()),
            is_lead: Set(agent.is_lead),
            source: Set(agent.source.clone()),
            created_at: Set(Utc::now().into()),
        };

        let inserted = model.insert(self.db.as_ref()).await?;
        inserted.try_into()
    }

    async fn add_property_type(
        &self,
        agent_id: Uuid,
        property_type: &str,
    ) -> Result<Agent, RepositoryError> {
        let model = self.find_agent(agent_id).await?;
        let mut tags = property_types(&model.property_types)?;
        if tags.iter().any(|t| t == property_type) {
            return model.try_into();
        }
        tags.push(property_type.to_string());

        let mut active: agent_entity::ActiveModel = model.into();
        active.property_types = Set(serde_json::json!(tags));
        let updated = active.update(self.db.as_ref()).await?;
        updated.try_into()
    }

    async fn create_listing(
        &self,
        listing: &ListingCandidate,
        agent_id: Uuid,
    ) -> Result<(Listing, bool), RepositoryError> {
        let model = listing_entity::ActiveModel {
            id: Set(Uuid::new_v4()),
            agent_id: Set(agent_id),
            title: Set(listing.title.clone()),
            price: Set(listing.price.clone()),
            location: Set(listing.location.clone()),
            property_type: Set(listing.property_type.clone()),
            bedrooms: Set(count_to_db(listing.bedrooms)),
            bathrooms: Set(count_to_db(listing.bathrooms)),
            url: Set(listing.url.clone()),
            image_url: Set(listing.image_url.clone()),
            created_at: Set(Utc::now().into()),
        };

        let inserted = match listing_entity::Entity::insert(model)
            .on_conflict(
                OnConflict::column(listing_entity::Column::Url)
                    .do_nothing()
                    .to_owned(),
            )
            .exec_without_returning(self.db.as_ref())
            .await
        {
            Ok(rows) => rows > 0,
            Err(DbErr::RecordNotInserted) => false,
            Err(e) => return Err(e.into()),
        };

        let stored = listing_entity::Entity::find()
            .filter(listing_entity::Column::Url.eq(listing.url.as_str()))
            .one(self.db.as_ref())
            .await?
            .ok_or(RepositoryError::NotFound)?;

        Ok((stored.into(), inserted))
    }

    async fn list_agents(&self, filter: &AgentFilter) -> Result<Vec<Agent>, RepositoryError> {
        let mut query = agent_entity::Entity::find();

        if filter.leads_only {
            query = query.filter(agent_entity::Column::IsLead.eq(true));
        }
        if let Some(location) = filter.location.as_deref().map(str::trim).filter(|l| !l.is_empty()) {
            let pattern = format!("%{}%", location.to_lowercase());
            query = query.filter(
                Expr::expr(Func::lower(Expr::col(agent_entity::Column::Location))).like(pattern),
            );
        }

        let models = query
            .order_by_desc(agent_entity::Column::CreatedAt)
            .all(self.db.as_ref())
            .await?;

        let mut agents = models
            .into_iter()
            .map(Agent::try_from)
            .collect::<Result<Vec<_>, _>>()?;

        // Tags live in a JSON column, so membership is checked after loading
        if let Some(property_type) = filter
            .property_type
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
        {
            agents.retain(|agent| {
                agent
                    .property_types
                    .iter()
                    .any(|t| t.eq_ignore_ascii_case(property_type))
            });
        }

        Ok(agents)
    }

    async fn listings_for_agent(&self, agent_id: Uuid) -> Result<Vec<Listing>, RepositoryError> {
        let models = listing_entity::Entity::find()
            .filter(listing_entity::Column::AgentId.eq(agent_id))
            .order_by_desc(listing_entity::Column::CreatedAt)
            .all(self.db.as_ref())
            .await?;
        Ok(models.into_iter().map(Into::into).collect())
    }

    async fn agent_stats(&self) -> Result<AgentStats, RepositoryError> {
        let total_agents = agent_entity::Entity::find().count(self.db.as_ref()).await?;
        let total_leads = agent_entity::Entity::find()
            .filter(agent_entity::Column::IsLead.eq(true))
            .count(self.db.as_ref())
            .await?;

        let rows: Vec<(String, i64)> = agent_entity::Entity::find()
            .select_only()
            .column(agent_entity::Column::Location)
            .column_as(Expr::col(agent_entity::Column::Id).count(), "count")
            .filter(agent_entity::Column::Location.is_not_null())
            .group_by(agent_entity::Column::Location)
            .into_tuple()
            .all(self.db.as_ref())
            .await?;

        let mut agents_by_location: Vec<LocationCount> = rows
            .into_iter()
            .map(|(location, count)| LocationCount {
                location,
                count: u64::try_from(count).unwrap_or(0),
            })
            .collect();
        agents_by_location.sort_by(|a, b| {
            b.count
                .cmp(&a.count)
                .then_with(|| a.location.cmp(&b.location))
        });

        Ok(AgentStats {
            total_agents,
            total_leads,
            agents_by_location,
        })
    }
}
