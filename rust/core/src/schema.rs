// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! IFC Schema Types
//!
//! Schema version detection and the `IfcProduct` subtype tree.

use std::fmt;

/// IFC schema release named in the header's FILE_SCHEMA
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SchemaVersion {
    Ifc2x3,
    Ifc4,
    Ifc4x3,
}

impl SchemaVersion {
    /// Detect the schema from the FILE_SCHEMA identifier, e.g. `IFC2X3`,
    /// `IFC4`, `IFC4X3_ADD2`. Unknown identifiers fall back to IFC4.
    pub fn from_identifier(identifier: &str) -> Self {
        let id = identifier.trim().to_ascii_uppercase();
        if id.starts_with("IFC2X") {
            Self::Ifc2x3
        } else if id.starts_with("IFC4X3") {
            Self::Ifc4x3
        } else {
            Self::Ifc4
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ifc2x3 => "IFC2X3",
            Self::Ifc4 => "IFC4",
            Self::Ifc4x3 => "IFC4X3",
        }
    }

    /// IFC2X3 styled items must reference IfcPresentationStyleAssignment
    /// instead of the style itself.
    pub fn requires_style_assignment(&self) -> bool {
        matches!(self, Self::Ifc2x3)
    }
}

impl fmt::Display for SchemaVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Every entity in the `IfcProduct` subtype tree across IFC2X3, IFC4 and
/// IFC4X3, abstract supertypes included.
const PRODUCT_TYPES: &[&str] = &[
    "IfcProduct",
    // Annotations, grids, ports, proxies
    "IfcAnnotation",
    "IfcGrid",
    "IfcPort",
    "IfcDistributionPort",
    "IfcProxy",
    // Positioning
    "IfcPositioningElement",
    "IfcLinearPositioningElement",
    "IfcLinearElement",
    "IfcReferent",
    "IfcAlignment",
    "IfcAlignmentCant",
    "IfcAlignmentHorizontal",
    "IfcAlignmentVertical",
    "IfcAlignmentSegment",
    // Spatial
    "IfcSpatialElement",
    "IfcSpatialStructureElement",
    "IfcSpatialZone",
    "IfcExternalSpatialStructureElement",
    "IfcExternalSpatialElement",
    "IfcSite",
    "IfcBuilding",
    "IfcBuildingStorey",
    "IfcSpace",
    "IfcFacility",
    "IfcFacilityPart",
    "IfcFacilityPartCommon",
    "IfcBridge",
    "IfcBridgePart",
    "IfcRoad",
    "IfcRoadPart",
    "IfcRailway",
    "IfcRailwayPart",
    "IfcMarineFacility",
    "IfcMarinePart",
    // Structural analysis items and activities
    "IfcStructuralItem",
    "IfcStructuralConnection",
    "IfcStructuralCurveConnection",
    "IfcStructuralPointConnection",
    "IfcStructuralSurfaceConnection",
    "IfcStructuralMember",
    "IfcStructuralCurveMember",
    "IfcStructuralCurveMemberVarying",
    "IfcStructuralSurfaceMember",
    "IfcStructuralSurfaceMemberVarying",
    "IfcStructuralActivity",
    "IfcStructuralAction",
    "IfcStructuralCurveAction",
    "IfcStructuralLinearAction",
    "IfcStructuralLinearActionVarying",
    "IfcStructuralPointAction",
    "IfcStructuralSurfaceAction",
    "IfcStructuralPlanarAction",
    "IfcStructuralPlanarActionVarying",
    "IfcStructuralReaction",
    "IfcStructuralCurveReaction",
    "IfcStructuralPointReaction",
    "IfcStructuralSurfaceReaction",
    // Elements
    "IfcElement",
    "IfcBuildingElement",
    "IfcBuiltElement",
    "IfcBeam",
    "IfcBeamStandardCase",
    "IfcBearing",
    "IfcBuildingElementProxy",
    "IfcChimney",
    "IfcColumn",
    "IfcColumnStandardCase",
    "IfcCourse",
    "IfcCovering",
    "IfcCurtainWall",
    "IfcDeepFoundation",
    "IfcDoor",
    "IfcDoorStandardCase",
    "IfcEarthworksElement",
    "IfcEarthworksFill",
    "IfcFooting",
    "IfcKerb",
    "IfcMember",
    "IfcMemberStandardCase",
    "IfcMooringDevice",
    "IfcNavigationElement",
    "IfcPavement",
    "IfcPile",
    "IfcPlate",
    "IfcPlateStandardCase",
    "IfcRail",
    "IfcRailing",
    "IfcRamp",
    "IfcRampFlight",
    "IfcReinforcedSoil",
    "IfcRoof",
    "IfcShadingDevice",
    "IfcSlab",
    "IfcSlabElementedCase",
    "IfcSlabStandardCase",
    "IfcStair",
    "IfcStairFlight",
    "IfcTrackElement",
    "IfcWall",
    "IfcWallElementedCase",
    "IfcWallStandardCase",
    "IfcWindow",
    "IfcWindowStandardCase",
    "IfcBuildingElementComponent",
    "IfcBuildingElementPart",
    "IfcCivilElement",
    "IfcElementAssembly",
    "IfcElementComponent",
    "IfcDiscreteAccessory",
    "IfcFastener",
    "IfcImpactProtectionDevice",
    "IfcMechanicalFastener",
    "IfcReinforcingElement",
    "IfcReinforcingBar",
    "IfcReinforcingMesh",
    "IfcSign",
    "IfcSignal",
    "IfcTendon",
    "IfcTendonAnchor",
    "IfcTendonConduit",
    "IfcVibrationDamper",
    "IfcVibrationIsolator",
    "IfcEquipmentElement",
    "IfcElectricalElement",
    "IfcFeatureElement",
    "IfcFeatureElementAddition",
    "IfcFeatureElementSubtraction",
    "IfcEarthworksCut",
    "IfcOpeningElement",
    "IfcOpeningStandardCase",
    "IfcProjectionElement",
    "IfcSurfaceFeature",
    "IfcVoidingFeature",
    "IfcFurnishingElement",
    "IfcFurniture",
    "IfcSystemFurnitureElement",
    "IfcGeographicElement",
    "IfcGeotechnicalElement",
    "IfcGeotechnicalAssembly",
    "IfcGeotechnicalStratum",
    "IfcBorehole",
    "IfcGeomodel",
    "IfcGeoslice",
    "IfcSolidStratum",
    "IfcVoidStratum",
    "IfcWaterStratum",
    "IfcTransportElement",
    "IfcTransportationDevice",
    "IfcVehicle",
    "IfcVirtualElement",
    // Distribution
    "IfcDistributionElement",
    "IfcDistributionControlElement",
    "IfcActuator",
    "IfcAlarm",
    "IfcController",
    "IfcFlowInstrument",
    "IfcProtectiveDeviceTrippingUnit",
    "IfcSensor",
    "IfcUnitaryControlElement",
    "IfcDistributionFlowElement",
    "IfcDistributionChamberElement",
    "IfcDistributionBoard",
    "IfcEnergyConversionDevice",
    "IfcAirToAirHeatRecovery",
    "IfcBoiler",
    "IfcBurner",
    "IfcChiller",
    "IfcCoil",
    "IfcCondenser",
    "IfcCooledBeam",
    "IfcCoolingTower",
    "IfcElectricGenerator",
    "IfcElectricMotor",
    "IfcEngine",
    "IfcEvaporativeCooler",
    "IfcEvaporator",
    "IfcHeatExchanger",
    "IfcHumidifier",
    "IfcMotorConnection",
    "IfcSolarDevice",
    "IfcTransformer",
    "IfcTubeBundle",
    "IfcUnitaryEquipment",
    "IfcFlowController",
    "IfcAirTerminalBox",
    "IfcDamper",
    "IfcElectricDistributionBoard",
    "IfcElectricTimeControl",
    "IfcFlowMeter",
    "IfcProtectiveDevice",
    "IfcSwitchingDevice",
    "IfcValve",
    "IfcFlowFitting",
    "IfcCableCarrierFitting",
    "IfcCableFitting",
    "IfcDuctFitting",
    "IfcJunctionBox",
    "IfcPipeFitting",
    "IfcFlowMovingDevice",
    "IfcCompressor",
    "IfcFan",
    "IfcPump",
    "IfcFlowSegment",
    "IfcCableCarrierSegment",
    "IfcCableSegment",
    "IfcConveyorSegment",
    "IfcDuctSegment",
    "IfcPipeSegment",
    "IfcFlowStorageDevice",
    "IfcElectricFlowStorageDevice",
    "IfcTank",
    "IfcFlowTerminal",
    "IfcAirTerminal",
    "IfcAudioVisualAppliance",
    "IfcCommunicationsAppliance",
    "IfcElectricAppliance",
    "IfcFireSuppressionTerminal",
    "IfcLamp",
    "IfcLightFixture",
    "IfcLiquidTerminal",
    "IfcMedicalDevice",
    "IfcMobileTelecommunicationsAppliance",
    "IfcOutlet",
    "IfcSanitaryTerminal",
    "IfcSpaceHeater",
    "IfcStackTerminal",
    "IfcWasteTerminal",
    "IfcFlowTreatmentDevice",
    "IfcDuctSilencer",
    "IfcElectricFlowTreatmentDevice",
    "IfcFilter",
    "IfcInterceptor",
];

/// Schema spelling of a product type keyword (`IFCWALL` -> `IfcWall`),
/// or `None` when the type is not an `IfcProduct`.
pub fn product_type_name(type_name: &str) -> Option<&'static str> {
    PRODUCT_TYPES
        .iter()
        .copied()
        .find(|name| name.eq_ignore_ascii_case(type_name))
}

/// Check whether a type keyword belongs to the `IfcProduct` subtype tree
pub fn is_product(type_name: &str) -> bool {
    product_type_name(type_name).is_some()
}

/// Display spelling for any type keyword: products use their schema
/// spelling, anything else is returned as written.
pub fn display_type_name(type_name: &str) -> String {
    match product_type_name(type_name) {
        Some(name) => name.to_string(),
        None => type_name.to_string(),
    }
}
