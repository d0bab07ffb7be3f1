use contracts::{CostDifference, InsuranceOption, PlanClass, PlanComparison, PlanCost};

use crate::catalog::Catalog;

/// Premium comparison between the first basic and the first enhanced plan.
pub fn compare_plans(catalog: &Catalog) -> Option<PlanComparison> {
    let basic = first_of_class(catalog, PlanClass::Basic)?;
    let enhanced = first_of_class(catalog, PlanClass::Enhanced)?;

    let basic_plan = plan_cost(basic);
    let enhanced_plan = plan_cost(enhanced);
    let cost_difference = CostDifference {
        monthly: enhanced_plan.monthly_cost - basic_plan.monthly_cost,
        annual: enhanced_plan.annual_cost - basic_plan.annual_cost,
    };

    Some(PlanComparison {
        basic_plan,
        enhanced_plan,
        cost_difference,
    })
}

fn first_of_class(catalog: &Catalog, class: PlanClass) -> Option<&InsuranceOption> {
    catalog
        .insurance_options()
        .iter()
        .find(|option| option.plan_class == class)
}

fn plan_cost(option: &InsuranceOption) -> PlanCost {
    PlanCost {
        id: option.id.clone(),
        name: option.name.clone(),
        monthly_cost: option.monthly_premium,
        annual_cost: option.annual_premium(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_comparison_reports_premium_deltas() {
        let comparison = compare_plans(&Catalog::builtin()).expect("both plan classes present");

        assert_eq!(comparison.basic_plan.id, "medishield_basic");
        assert_eq!(comparison.basic_plan.annual_cost, 1_800.0);
        assert_eq!(comparison.enhanced_plan.id, "integrated_shield");
        assert_eq!(comparison.enhanced_plan.annual_cost, 5_400.0);
        assert_eq!(comparison.cost_difference.monthly, 300.0);
        assert_eq!(comparison.cost_difference.annual, 3_600.0);
    }

    #[test]
    fn missing_class_yields_none() {
        let builtin = Catalog::builtin();
        let basic_only = builtin
            .insurance_options()
            .iter()
            .filter(|option| option.plan_class == PlanClass::Basic)
            .cloned()
            .collect();
        let catalog = Catalog::new(
            basic_only,
            builtin.characters().to_vec(),
            builtin.scenarios().to_vec(),
        )
        .expect("valid catalog");

        assert!(compare_plans(&catalog).is_none());
    }
}
