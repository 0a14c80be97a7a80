//! Services and operations of each API version
//!
//! Every operation lists its parameters, in schema order, with the kind of
//! value each one takes, and the shape of what it returns.

use crate::version::ApiVersion;

/// Kind of value a parameter takes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamKind {
    /// PQL statement, checked by [`crate::validate_statement`]
    Statement,
    /// Bulk action on the given entity, checked by [`crate::validate_action`]
    Action(&'static str),
    /// One entity
    Entity,
    /// A list of entities (a single entity is accepted as a list of one)
    EntityList,
    /// Text, identifiers and enums
    Scalar,
}

/// Named parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParamSpec {
    pub name: &'static str,
    pub kind: ParamKind,
}

/// Shape of an operation result
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReturnShape {
    Nothing,
    Single,
    /// Always a sequence
    Collection,
    /// Struct whose `results` is always a sequence
    Page,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OperationSpec {
    pub name: &'static str,
    pub params: &'static [ParamSpec],
    pub returns: ReturnShape,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServiceSpec {
    pub name: &'static str,
    /// First version serving it
    pub since: ApiVersion,
    pub operations: &'static [OperationSpec],
}

impl ServiceSpec {
    pub fn operation(&self, name: &str) -> Option<&'static OperationSpec> {
        self.operations.iter().find(|op| op.name == name)
    }

    pub fn is_available(&self, version: ApiVersion) -> bool {
        version >= self.since
    }
}

macro_rules! param {
    ($name:expr, $kind:expr) => {
        ParamSpec {
            name: $name,
            kind: $kind,
        }
    };
}

macro_rules! op {
    ($name:expr, $params:expr, $returns:expr $(,)?) => {
        OperationSpec {
            name: $name,
            params: $params,
            returns: $returns,
        }
    };
}

const FILTER: ParamSpec = param!("filterStatement", ParamKind::Statement);

/// Create, get and update operations shared by entity services.
macro_rules! entity_service {
    (
        $name:literal, $since:expr,
        $entity:literal, $entities:literal, $singular:literal, $plural:literal, $id:literal
        $(; $extra:expr)*
    ) => {
        ServiceSpec {
            name: $name,
            since: $since,
            operations: &[
                op!(
                    concat!("create", $entity),
                    &[param!($singular, ParamKind::Entity)],
                    ReturnShape::Single,
                ),
                op!(
                    concat!("create", $entities),
                    &[param!($plural, ParamKind::EntityList)],
                    ReturnShape::Collection,
                ),
                op!(
                    concat!("get", $entity),
                    &[param!($id, ParamKind::Scalar)],
                    ReturnShape::Single,
                ),
                op!(
                    concat!("get", $entities, "ByStatement"),
                    &[FILTER],
                    ReturnShape::Page,
                ),
                op!(
                    concat!("update", $entity),
                    &[param!($singular, ParamKind::Entity)],
                    ReturnShape::Single,
                ),
                op!(
                    concat!("update", $entities),
                    &[param!($plural, ParamKind::EntityList)],
                    ReturnShape::Collection,
                ),
                $($extra,)*
            ],
        }
    };
}

/// `perform{Entity}Action(action, filterStatement)`
macro_rules! perform_action {
    ($entity:literal, $param:literal) => {
        op!(
            concat!("perform", $entity, "Action"),
            &[param!($param, ParamKind::Action($entity)), FILTER],
            ReturnShape::Single,
        )
    };
}

use ApiVersion::{V201004, V201010, V201101, V201103};

static SERVICES: &[ServiceSpec] = &[
    entity_service!(
        "CompanyService", V201004,
        "Company", "Companies", "company", "companies", "companyId"
    ),
    entity_service!(
        "CreativeService", V201004,
        "Creative", "Creatives", "creative", "creatives", "creativeId"
    ),
    ServiceSpec {
        name: "ForecastService",
        since: V201004,
        operations: &[
            op!(
                "getForecast",
                &[param!("lineItem", ParamKind::Entity)],
                ReturnShape::Single,
            ),
            op!(
                "getForecastById",
                &[param!("lineItemId", ParamKind::Scalar)],
                ReturnShape::Single,
            ),
        ],
    },
    entity_service!(
        "InventoryService", V201004,
        "AdUnit", "AdUnits", "adUnit", "adUnits", "adUnitId";
        perform_action!("AdUnit", "adUnitAction")
    ),
    entity_service!(
        "LabelService", V201101,
        "Label", "Labels", "label", "labels", "labelId";
        perform_action!("Label", "labelAction")
    ),
    entity_service!(
        "LineItemService", V201004,
        "LineItem", "LineItems", "lineItem", "lineItems", "lineItemId";
        perform_action!("LineItem", "lineItemAction")
    ),
    ServiceSpec {
        name: "LineItemCreativeAssociationService",
        since: V201004,
        operations: &[
            op!(
                "createLineItemCreativeAssociation",
                &[param!("lineItemCreativeAssociation", ParamKind::Entity)],
                ReturnShape::Single,
            ),
            op!(
                "createLineItemCreativeAssociations",
                &[param!("lineItemCreativeAssociations", ParamKind::EntityList)],
                ReturnShape::Collection,
            ),
            op!(
                "getLineItemCreativeAssociation",
                &[
                    param!("lineItemId", ParamKind::Scalar),
                    param!("creativeId", ParamKind::Scalar),
                ],
                ReturnShape::Single,
            ),
            op!(
                "getLineItemCreativeAssociationsByStatement",
                &[FILTER],
                ReturnShape::Page,
            ),
            op!(
                "updateLineItemCreativeAssociation",
                &[param!("lineItemCreativeAssociation", ParamKind::Entity)],
                ReturnShape::Single,
            ),
            op!(
                "updateLineItemCreativeAssociations",
                &[param!("lineItemCreativeAssociations", ParamKind::EntityList)],
                ReturnShape::Collection,
            ),
            perform_action!(
                "LineItemCreativeAssociation",
                "lineItemCreativeAssociationAction"
            ),
        ],
    },
    ServiceSpec {
        name: "NetworkService",
        since: V201004,
        operations: &[
            op!("getAllNetworks", &[], ReturnShape::Collection),
            op!("getCurrentNetwork", &[], ReturnShape::Single),
            op!(
                "updateNetwork",
                &[param!("network", ParamKind::Entity)],
                ReturnShape::Single,
            ),
        ],
    },
    entity_service!(
        "OrderService", V201004,
        "Order", "Orders", "order", "orders", "orderId";
        perform_action!("Order", "orderAction")
    ),
    entity_service!(
        "PlacementService", V201004,
        "Placement", "Placements", "placement", "placements", "placementId";
        perform_action!("Placement", "placementAction")
    ),
    ServiceSpec {
        name: "ReportService",
        since: V201010,
        operations: &[
            op!(
                "runReportJob",
                &[param!("reportJob", ParamKind::Entity)],
                ReturnShape::Single,
            ),
            op!(
                "getReportJob",
                &[param!("reportJobId", ParamKind::Scalar)],
                ReturnShape::Single,
            ),
            op!(
                "getReportDownloadURL",
                &[
                    param!("reportJobId", ParamKind::Scalar),
                    param!("exportFormat", ParamKind::Scalar),
                ],
                ReturnShape::Single,
            ),
        ],
    },
    entity_service!(
        "UserService", V201004,
        "User", "Users", "user", "users", "userId";
        op!("getAllRoles", &[], ReturnShape::Collection);
        op!("getCurrentUser", &[], ReturnShape::Single);
        perform_action!("User", "userAction")
    ),
    ServiceSpec {
        name: "CustomTargetingService",
        since: V201101,
        operations: &[
            op!(
                "createCustomTargetingKeys",
                &[param!("keys", ParamKind::EntityList)],
                ReturnShape::Collection,
            ),
            op!(
                "createCustomTargetingValues",
                &[param!("values", ParamKind::EntityList)],
                ReturnShape::Collection,
            ),
            op!(
                "getCustomTargetingKeysByStatement",
                &[FILTER],
                ReturnShape::Page,
            ),
            op!(
                "getCustomTargetingValuesByStatement",
                &[FILTER],
                ReturnShape::Page,
            ),
        ],
    },
    ServiceSpec {
        name: "PublisherQueryLanguageService",
        since: V201103,
        operations: &[op!(
            "select",
            &[param!("selectStatement", ParamKind::Statement)],
            ReturnShape::Single,
        )],
    },
];

/// Looks up a service available in `version`.
pub fn service_spec(name: &str, version: ApiVersion) -> Option<&'static ServiceSpec> {
    SERVICES
        .iter()
        .find(|s| s.name == name && s.is_available(version))
}

/// Services available in `version`.
pub fn services(version: ApiVersion) -> impl Iterator<Item = &'static ServiceSpec> {
    SERVICES.iter().filter(move |s| s.is_available(version))
}
