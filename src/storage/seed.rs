//! Demonstration records so a fresh deployment has something to show.
//!
//! Seeding is skipped when any service already exists, which makes it safe
//! to run on every start against either backend.

use chrono::{NaiveDate, TimeZone, Utc};

use crate::schema::*;
use crate::storage::{Storage, StorageResult};

struct DemoService {
    name: &'static str,
    short_desc: &'static str,
    description: &'static str,
    price: &'static str,
    featured: bool,
    /// (title, description, location, difficulty)
    projects: &'static [(&'static str, &'static str, &'static str, Difficulty)],
}

const SERVICES: &[DemoService] = &[
    DemoService {
        name: "Lawn Care",
        short_desc: "Weekly mowing, edging and seasonal feeding.",
        description: "Regular mowing, edging, trimming and fertilization programs that keep \
                      your lawn healthy through every season.",
        price: "From $45 per visit",
        featured: true,
        projects: &[(
            "Suburban Lawn Renovation",
            "Dethatched, aerated and overseeded a patchy front lawn, then put it on a \
             feeding schedule.",
            "Maple Grove",
            Difficulty::Easy,
        )],
    },
    DemoService {
        name: "Landscape Design",
        short_desc: "Planting plans drawn around how you use the yard.",
        description: "Site survey, planting plans and installation of beds, shrubs and trees \
                      suited to your soil and light.",
        price: "Quoted per project",
        featured: true,
        projects: &[
            (
                "Cottage Garden Makeover",
                "Replaced a bare side yard with layered perennial beds and a gravel path.",
                "Riverside",
                Difficulty::Moderate,
            ),
            (
                "Front Entry Refresh",
                "New foundation plantings and mulched beds framing the front walk.",
                "Oak Park",
                Difficulty::Easy,
            ),
        ],
    },
    DemoService {
        name: "Hardscaping",
        short_desc: "Patios, walkways and retaining walls.",
        description: "Paver patios, natural stone walkways, steps and retaining walls built \
                      on properly compacted bases.",
        price: "From $18 per sq ft",
        featured: true,
        projects: &[(
            "Backyard Patio Installation",
            "A 400 sq ft paver patio with a seat wall and integrated lighting.",
            "Lakeside",
            Difficulty::Complex,
        )],
    },
    DemoService {
        name: "Seasonal Cleanup",
        short_desc: "Spring and fall cleanups.",
        description: "Leaf removal, bed cleanup, pruning and debris haul-away at the start \
                      and end of the growing season.",
        price: "From $150",
        featured: false,
        projects: &[],
    },
];

/// (title, excerpt, content, month, day)
const POSTS: &[(&str, &str, &str, u32, u32)] = &[
    (
        "5 Tips for a Healthier Lawn This Spring",
        "Small changes in mowing height and watering make a big difference.",
        "<p>Raise your mowing height, water deeply but less often, and feed in early \
         spring. A soil test tells you what your lawn actually needs.</p>",
        3,
        4,
    ),
    (
        "Choosing Pavers for Your Patio",
        "Concrete, clay or natural stone: what to weigh before you build.",
        "<p>Concrete pavers are affordable and consistent, clay holds its color, and \
         natural stone lasts for generations. Pick based on budget and style.</p>",
        4,
        18,
    ),
    (
        "Why Fall Is the Best Time to Plant Trees",
        "Cool air and warm soil give roots a head start.",
        "<p>Planting in fall lets roots establish before summer heat arrives, which \
         means less watering and stronger trees.</p>",
        9,
        9,
    ),
];

/// (name, role, content, rating)
const TESTIMONIALS: &[(&str, &str, &str, i32)] = &[
    (
        "Sarah Johnson",
        "Homeowner",
        "Our backyard went from an eyesore to our favorite room of the house.",
        5,
    ),
    (
        "Michael Chen",
        "Property Manager",
        "Reliable every week, and they always leave the grounds spotless.",
        5,
    ),
    (
        "Emily Rodriguez",
        "Homeowner",
        "The new patio came in on time and on budget. Highly recommended.",
        4,
    ),
];

/// Insert the demo set unless the store already has services.
///
/// Returns whether anything was written.
pub async fn seed_demo_data(storage: &dyn Storage) -> StorageResult<bool> {
    if !storage.get_services().await?.is_empty() {
        tracing::debug!("Services already present; skipping demo data");
        return Ok(false);
    }

    for (index, demo) in SERVICES.iter().enumerate() {
        let service = storage
            .create_service(InsertService {
                name: demo.name.to_string(),
                description: demo.description.to_string(),
                short_desc: Some(demo.short_desc.to_string()),
                price: Some(demo.price.to_string()),
                image_url: None,
                featured: demo.featured,
            })
            .await?;

        for (offset, (title, description, location, difficulty)) in
            demo.projects.iter().enumerate()
        {
            storage
                .create_portfolio_item(InsertPortfolioItem {
                    title: title.to_string(),
                    description: description.to_string(),
                    service_id: Some(service.id.clone()),
                    date: NaiveDate::from_ymd_opt(2024, 5 + index as u32, 10 + offset as u32),
                    location: Some(location.to_string()),
                    difficulty: Some(*difficulty),
                    status: PortfolioStatus::Published,
                    ..Default::default()
                })
                .await?;
        }
    }

    for (title, excerpt, content, month, day) in POSTS {
        storage
            .create_blog_post(InsertBlogPost {
                title: title.to_string(),
                excerpt: Some(excerpt.to_string()),
                content: content.to_string(),
                published_at: Utc.with_ymd_and_hms(2024, *month, *day, 9, 0, 0).single(),
                ..Default::default()
            })
            .await?;
    }

    for (order, (name, role, content, rating)) in TESTIMONIALS.iter().enumerate() {
        storage
            .create_testimonial(InsertTestimonial {
                name: name.to_string(),
                role: Some(role.to_string()),
                content: content.to_string(),
                rating: *rating,
                image_url: None,
                display_order: order as i32 + 1,
            })
            .await?;
    }

    tracing::info!(
        backend = storage.backend_name(),
        services = SERVICES.len(),
        posts = POSTS.len(),
        testimonials = TESTIMONIALS.len(),
        "Seeded demo data"
    );
    Ok(true)
}
