//! Named example requests for demos and smoke runs.

use serde::Serialize;

#[derive(Debug, Clone, Copy, Serialize)]
pub struct Scenario {
    pub key: &'static str,
    pub name: &'static str,
    pub request: &'static str,
}

const SCENARIOS: [Scenario; 6] = [
    Scenario {
        key: "incident",
        name: "Critical Incident Response",
        request: "We have a critical system outage affecting tax calculations for multiple customers. \
                  The issue started 2 hours ago and support is getting escalated tickets. What's our \
                  incident response plan, what SLAs are at risk, and what should we communicate to customers?",
    },
    Scenario {
        key: "customer_qbr",
        name: "Customer QBR Preparation",
        request: "I have a Quarterly Business Review with customer CUST-005 (TechFlow Solutions) next week. \
                  Prepare a comprehensive customer health report including their support history, any \
                  compliance issues, revenue trends, and churn risk indicators. Also identify any upsell opportunities.",
    },
    Scenario {
        key: "audit_prep",
        name: "SOC 2 Audit Preparation",
        request: "Our SOC 2 Type II audit is scheduled for next month. Assess our readiness across all \
                  control domains - security policies, access controls, vulnerability management, backup \
                  procedures, and incident response. Identify any gaps that need immediate remediation.",
    },
    Scenario {
        key: "compliance_review",
        name: "End of Quarter Compliance",
        request: "We're approaching end of Q4. Provide a comprehensive compliance status report: Which tax \
                  filings are due in the next 30 days? Are there any overdue filings? Which customers have \
                  expiring exemption certificates? What's our patch compliance status? Flag anything that \
                  could result in penalties or audit findings.",
    },
    Scenario {
        key: "risk_assessment",
        name: "Enterprise Risk Assessment",
        request: "The board wants an enterprise risk assessment. Analyze our current risk posture across: \
                  security vulnerabilities, compliance gaps, customer churn indicators, vendor dependencies, \
                  and operational bottlenecks. Prioritize the top 5 risks with recommended mitigations.",
    },
    Scenario {
        key: "revenue_analysis",
        name: "Revenue & Product Strategy",
        request: "Finance needs a strategic analysis: Which products are driving the most revenue? Which \
                  ones are underperforming? What's in the roadmap that could impact pricing? Are there \
                  customers at high churn risk that could affect forecasts? Provide insights for the \
                  upcoming planning cycle.",
    },
];

/// All scenarios, in display order.
pub fn all() -> &'static [Scenario] {
    &SCENARIOS
}

pub fn scenario(key: &str) -> Option<&'static Scenario> {
    let key = key.trim();
    SCENARIOS.iter().find(|s| s.key.eq_ignore_ascii_case(key))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup() {
        assert_eq!(all().len(), 6);
        let s = scenario("incident").unwrap();
        assert_eq!(s.name, "Critical Incident Response");
        assert!(s.request.starts_with("We have a critical system outage"));
        assert!(s.request.contains("The issue started 2 hours ago"));
        assert!(scenario(" AUDIT_PREP ").is_some());
        assert!(scenario("payroll").is_none());
    }
}
