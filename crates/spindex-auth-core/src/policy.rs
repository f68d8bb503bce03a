//! Access policy decisions
//!
//! Pure functions over a caller's role and entitlement record. All
//! authorization in the service reduces to these checks; handlers never
//! inspect subscription fields directly.

use serde::Serialize;

use spindex_types::{Entitlement, Plan, Role, SubscriptionStatus};

/// Check whether an entitlement grants paid access
///
/// Paid access requires an active subscription on one of the pro plans.
/// Status is authoritative: a lapsed billing period only revokes access
/// once the payment processor reports the status change.
pub fn is_entitled(entitlement: Option<&Entitlement>) -> bool {
    match entitlement {
        Some(e) => {
            e.status == SubscriptionStatus::Active
                && matches!(e.plan, Some(Plan::ProMonthly) | Some(Plan::ProAnnual))
        }
        None => false,
    }
}

/// Check whether a caller may see gated directory fields
///
/// Admins always may; everyone else needs a paid entitlement.
pub fn can_view_gated_field(role: Role, entitlement: Option<&Entitlement>) -> bool {
    role.is_admin() || is_entitled(entitlement)
}

/// Check whether a role carries administrative rights
pub fn is_admin(role: Role) -> bool {
    role.is_admin()
}

/// Capabilities derived once per request from role and entitlement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CapabilitySet {
    /// May see gated directory fields (person emails)
    pub view_gated_fields: bool,
    /// May mutate catalog entities
    pub administer: bool,
    /// May use the outreach workflow
    pub run_outreach: bool,
}

impl CapabilitySet {
    /// The empty capability set of an unauthenticated caller
    pub const fn none() -> Self {
        Self {
            view_gated_fields: false,
            administer: false,
            run_outreach: false,
        }
    }
}

/// Derive the capability set for an authenticated caller
///
/// The outreach workflow is strictly entitlement-gated; administrative
/// rights do not substitute for a subscription there.
pub fn derive_capabilities(role: Role, entitlement: Option<&Entitlement>) -> CapabilitySet {
    CapabilitySet {
        view_gated_fields: can_view_gated_field(role, entitlement),
        administer: is_admin(role),
        run_outreach: is_entitled(entitlement),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use spindex_types::UserId;

    fn entitlement(status: SubscriptionStatus, plan: Option<Plan>) -> Entitlement {
        Entitlement {
            user_id: UserId::new("user_1"),
            stripe_customer_id: Some("cus_1".to_string()),
            stripe_subscription_id: Some("sub_1".to_string()),
            status,
            plan,
            current_period_end: Some(Utc::now() + Duration::days(30)),
            last_event_at: Some(Utc::now()),
        }
    }

    #[test]
    fn test_active_pro_monthly_is_entitled() {
        let e = entitlement(SubscriptionStatus::Active, Some(Plan::ProMonthly));
        assert!(is_entitled(Some(&e)));
    }

    #[test]
    fn test_active_pro_annual_is_entitled() {
        let e = entitlement(SubscriptionStatus::Active, Some(Plan::ProAnnual));
        assert!(is_entitled(Some(&e)));
    }

    #[test]
    fn test_active_without_plan_is_not_entitled() {
        let e = entitlement(SubscriptionStatus::Active, None);
        assert!(!is_entitled(Some(&e)));
    }

    #[test]
    fn test_canceled_is_not_entitled() {
        let e = entitlement(SubscriptionStatus::Canceled, Some(Plan::ProMonthly));
        assert!(!is_entitled(Some(&e)));
    }

    #[test]
    fn test_past_due_is_not_entitled() {
        let e = entitlement(SubscriptionStatus::PastDue, Some(Plan::ProMonthly));
        assert!(!is_entitled(Some(&e)));
    }

    #[test]
    fn test_trialing_is_not_entitled() {
        let e = entitlement(SubscriptionStatus::Trialing, Some(Plan::ProAnnual));
        assert!(!is_entitled(Some(&e)));
    }

    #[test]
    fn test_missing_record_is_not_entitled() {
        assert!(!is_entitled(None));
    }

    #[test]
    fn test_expired_period_with_active_status_is_still_entitled() {
        // Entitlement follows reported status, not the clock. The
        // processor sends an event when the period actually lapses.
        let mut e = entitlement(SubscriptionStatus::Active, Some(Plan::ProMonthly));
        e.current_period_end = Some(Utc::now() - Duration::days(3));
        assert!(is_entitled(Some(&e)));
    }

    #[test]
    fn test_admin_sees_gated_fields_without_subscription() {
        assert!(can_view_gated_field(Role::Admin, None));
    }

    #[test]
    fn test_admin_with_canceled_subscription_sees_gated_fields() {
        let e = entitlement(SubscriptionStatus::Canceled, Some(Plan::ProMonthly));
        assert!(can_view_gated_field(Role::Admin, Some(&e)));
    }

    #[test]
    fn test_plain_user_without_subscription_cannot_see_gated_fields() {
        assert!(!can_view_gated_field(Role::User, None));
    }

    #[test]
    fn test_entitled_user_sees_gated_fields() {
        let e = entitlement(SubscriptionStatus::Active, Some(Plan::ProAnnual));
        assert!(can_view_gated_field(Role::User, Some(&e)));
    }

    #[test]
    fn test_admin_without_subscription_cannot_run_outreach() {
        let caps = derive_capabilities(Role::Admin, None);
        assert!(caps.view_gated_fields);
        assert!(caps.administer);
        assert!(!caps.run_outreach);
    }

    #[test]
    fn test_entitled_user_capabilities() {
        let e = entitlement(SubscriptionStatus::Active, Some(Plan::ProMonthly));
        let caps = derive_capabilities(Role::User, Some(&e));
        assert!(caps.view_gated_fields);
        assert!(!caps.administer);
        assert!(caps.run_outreach);
    }

    #[test]
    fn test_entitled_admin_has_all_capabilities() {
        let e = entitlement(SubscriptionStatus::Active, Some(Plan::ProAnnual));
        let caps = derive_capabilities(Role::Admin, Some(&e));
        assert!(caps.view_gated_fields);
        assert!(caps.administer);
        assert!(caps.run_outreach);
    }

    #[test]
    fn test_empty_capability_set_denies_everything() {
        let caps = CapabilitySet::none();
        assert!(!caps.view_gated_fields);
        assert!(!caps.administer);
        assert!(!caps.run_outreach);
    }
}
