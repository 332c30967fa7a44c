//! Static bit layouts of the supported message types, compiled once as
//! constants and interpreted by the generic bit reader.

use super::{Field, flag, int, uint};

/// Header shared by the GPS observation messages 1001-1004 (the 12 bit
/// message type itself is consumed before the schema applies).
const GPS_OBSERVATION_HEADER: &[Field] = &[
    uint("refStationId", 12),
    uint("tow", 30),
    flag("syncGnssFlag"),
    uint("numSignalsObs", 5),
    flag("divFreeSmoothFlag"),
    uint("smoothInterval", 3),
];

/// Header shared by the GLONASS observation messages 1009-1012; the
/// epoch is 27 bits of milliseconds in the GLONASS day.
const GLONASS_OBSERVATION_HEADER: &[Field] = &[
    uint("refStationId", 12),
    uint("epochTime", 27),
    flag("syncGnssFlag"),
    uint("numSignalsObs", 5),
    flag("divFreeSmoothFlag"),
    uint("smoothInterval", 3),
];

const MSG1001_OBSERVATION: &[Field] = &[
    uint("satId", 6),
    flag("l1CodeFlag"),
    uint("l1Pseudorange", 24),
    int("l1PhaserangeL1PseudorangeDiff", 20),
    uint("l1LockTimeIndicator", 7),
];

const MSG1002_OBSERVATION: &[Field] = &[
    uint("satId", 6),
    flag("l1CodeFlag"),
    uint("l1Pseudorange", 24),
    int("l1PhaserangeL1PseudorangeDiff", 20),
    uint("l1LockTimeIndicator", 7),
    uint("l1PseudorangeAmbiguity", 8),
    uint("l1CNR", 8),
];

const MSG1003_OBSERVATION: &[Field] = &[
    uint("satId", 6),
    flag("l1CodeFlag"),
    uint("l1Pseudorange", 24),
    int("l1PhaserangeL1PseudorangeDiff", 20),
    uint("l1LockTimeIndicator", 7),
    flag("l2CodeFlag"),
    uint("l2L1PseudorangeDiff", 24),
    int("l2PhaserangeL1PseudorangeDiff", 20),
    uint("l2LockTimeIndicator", 7),
];

const MSG1004_OBSERVATION: &[Field] = &[
    uint("satId", 6),
    flag("l1CodeFlag"),
    uint("l1Pseudorange", 24),
    int("l1PhaserangeL1PseudorangeDiff", 20),
    uint("l1LockTimeIndicator", 7),
    uint("l1PseudorangeAmbiguity", 8),
    uint("l1CNR", 8),
    flag("l2CodeFlag"),
    uint("l2L1PseudorangeDiff", 24),
    int("l2PhaserangeL1PseudorangeDiff", 20),
    uint("l2LockTimeIndicator", 7),
    uint("l2CNR", 8),
];

const MSG1009_OBSERVATION: &[Field] = &[
    uint("satId", 6),
    flag("codeFlag"),
    uint("freqChannelNumber", 5),
    uint("l1Pseudorange", 24),
    int("l1PhaserangeL1PseudorangeDiff", 20),
    uint("l1LockTimeIndicator", 7),
];

const MSG1010_OBSERVATION: &[Field] = &[
    uint("satId", 6),
    flag("codeFlag"),
    uint("freqChannelNumber", 5),
    uint("l1Pseudorange", 24),
    int("l1PhaserangeL1PseudorangeDiff", 20),
    uint("l1LockTimeIndicator", 7),
    uint("l1PseudorangeAmbiguity", 8),
    uint("l1CNR", 8),
];

const MSG1011_OBSERVATION: &[Field] = &[
    uint("satId", 6),
    flag("codeFlag"),
    uint("freqChannelNumber", 5),
    uint("l1Pseudorange", 24),
    int("l1PhaserangeL1PseudorangeDiff", 20),
    uint("l1LockTimeIndicator", 7),
    flag("l2CodeFlag"),
    uint("l2L1PseudorangeDiff", 24),
    int("l2PhaserangeL1PseudorangeDiff", 20),
    uint("l2LockTimeIndicator", 7),
];

const MSG1012_OBSERVATION: &[Field] = &[
    uint("satId", 6),
    flag("codeFlag"),
    uint("freqChannelNumber", 5),
    uint("l1Pseudorange", 24),
    int("l1PhaserangeL1PseudorangeDiff", 20),
    uint("l1LockTimeIndicator", 7),
    uint("l1PseudorangeAmbiguity", 8),
    uint("l1CNR", 8),
    flag("l2CodeFlag"),
    uint("l2L1PseudorangeDiff", 24),
    int("l2PhaserangeL1PseudorangeDiff", 20),
    uint("l2LockTimeIndicator", 7),
    uint("l2CNR", 8),
];

/// Header and per-satellite row layout of an observation message.
pub(crate) fn observation(message_type: u16) -> Option<(&'static [Field], &'static [Field])> {
    Some(match message_type {
        1001 => (GPS_OBSERVATION_HEADER, MSG1001_OBSERVATION),
        1002 => (GPS_OBSERVATION_HEADER, MSG1002_OBSERVATION),
        1003 => (GPS_OBSERVATION_HEADER, MSG1003_OBSERVATION),
        1004 => (GPS_OBSERVATION_HEADER, MSG1004_OBSERVATION),
        1009 => (GLONASS_OBSERVATION_HEADER, MSG1009_OBSERVATION),
        1010 => (GLONASS_OBSERVATION_HEADER, MSG1010_OBSERVATION),
        1011 => (GLONASS_OBSERVATION_HEADER, MSG1011_OBSERVATION),
        1012 => (GLONASS_OBSERVATION_HEADER, MSG1012_OBSERVATION),
        _ => return None,
    })
}

/// Satellite data layout of MSM subtypes 1, 2 and 3.
pub(crate) const MSM123_SATELLITE: &[Field] = &[uint("roughRangeMod1ms", 10)];

/// Satellite data layout of MSM subtypes 4 and 6.
pub(crate) const MSM46_SATELLITE: &[Field] =
    &[uint("numIntMsRoughRange", 8), uint("roughRangeMod1ms", 10)];

/// Satellite data layout of MSM subtypes 5 and 7.
pub(crate) const MSM57_SATELLITE: &[Field] = &[
    uint("numIntMsRoughRange", 8),
    uint("extSatInfo", 4),
    uint("roughRangeMod1ms", 10),
    int("roughPhaseRangeRate", 14),
];

pub(crate) const MSM1_SIGNAL: &[Field] = &[int("finePseudorange", 15)];

pub(crate) const MSM2_SIGNAL: &[Field] = &[
    int("finePhaserange", 22),
    uint("phaserangeLockTimeIndicator", 4),
    flag("halfCycleAmbiguity"),
];

pub(crate) const MSM3_SIGNAL: &[Field] = &[
    int("finePseudorange", 15),
    int("finePhaserange", 22),
    uint("phaserangeLockTimeIndicator", 4),
    flag("halfCycleAmbiguity"),
];

pub(crate) const MSM4_SIGNAL: &[Field] = &[
    int("finePseudorange", 15),
    int("finePhaserange", 22),
    uint("phaserangeLockTimeIndicator", 4),
    flag("halfCycleAmbiguity"),
    uint("signalCNR", 6),
];

pub(crate) const MSM5_SIGNAL: &[Field] = &[
    int("finePseudorange", 15),
    int("finePhaserange", 22),
    uint("phaserangeLockTimeIndicator", 4),
    flag("halfCycleAmbiguity"),
    uint("signalCNR", 6),
    int("finePhaserangeRate", 15),
];

pub(crate) const MSM6_SIGNAL: &[Field] = &[
    int("finePseudorangeExtRes", 20),
    int("finePhaserangeExtRes", 24),
    uint("phaserangeLockTimeIndicatorExtRes", 10),
    flag("halfCycleAmbiguity"),
    uint("signalCNRExtRes", 10),
];

pub(crate) const MSM7_SIGNAL: &[Field] = &[
    int("finePseudorangeExtRes", 20),
    int("finePhaserangeExtRes", 24),
    uint("phaserangeLockTimeIndicatorExtRes", 10),
    flag("halfCycleAmbiguity"),
    uint("signalCNRExtRes", 10),
    int("finePhaserangeRate", 15),
];

/// The canonical english phrase of a message type, or a generic
/// sentinel when no schema or description is registered.
pub fn describe(message_type: u16) -> &'static str {
    match message_type {
        1001 => "L1-Only GPS RTK Observables",
        1002 => "Extended L1-Only GPS RTK Observables",
        1003 => "L1 & L2 GPS RTK Observables",
        1004 => "Extended L1 & L2 GPS RTK Observables",
        1005 => "Stationary RTK Reference Station ARP",
        1006 => "Stationary RTK Reference Station ARP with Antenna Height",
        1007 => "Antenna Descriptor",
        1008 => "Antenna Descriptor & Serial Number",
        1009 => "L1-Only GLONASS RTK Observables",
        1010 => "Extended L1-Only GLONASS RTK Observables",
        1011 => "L1 & L2 GLONASS RTK Observables",
        1012 => "Extended L1 & L2 GLONASS RTK Observables",
        1013 => "System Parameters",
        1014 => "Network Auxiliary Station Data",
        1015 => "GPS Ionospheric Correction Differences",
        1016 => "GPS Geometric Correction Differences",
        1017 => "GPS Combined Geometric and Ionospheric Correction Differences",
        1018 => "RESERVED for Alternative Ionospheric Correction Difference Message",
        1019 => "GPS Ephemerides",
        1020 => "GLONASS Ephemerides",
        1021 => "Helmert / Abridged Molodenski Transformation Parameters",
        1022 => "Molodenski-Badekas Transformation Parameters",
        1023 => "Residuals, Ellipsoidal Grid Representation",
        1024 => "Residuals, Plane Grid Representation",
        1025 => {
            "Projection Parameters, Projection Types other than Lambert Conic Conformal (2 SP) \
             and Oblique Mercator"
        }
        1026 => "Projection Parameters, Projection Type LCC2SP (Lambert Conic Conformal (2 SP))",
        1027 => "Projection Parameters, Projection Type OM (Oblique Mercator)",
        1028 => "(Reserved for Global to Plate-Fixed Transformation)",
        1029 => "Unicode Text String",
        1030 => "GPS Network RTK Residual Message",
        1031 => "GLONASS Network RTK Residual Message",
        1032 => "Physical Reference Station Position Message",
        1033 => "Receiver and Antenna Descriptors",
        1034 => "GPS Network FKP Gradient",
        1035 => "GLONASS Network FKP Gradient",
        1037 => "GLONASS Ionospheric Correction Differences",
        1038 => "GLONASS Geometric Correction Differences",
        1039 => "GLONASS Combined Geometric and Ionospheric Correction Differences",
        1042 => "BDS Satellite Ephemeris Data",
        1044 => "QZSS Ephemerides",
        1045 => "Galileo F/NAV Satellite Ephemeris Data",
        1046 => "Galileo I/NAV Satellite Ephemeris Data",
        1057 => "SSR GPS Orbit Correction",
        1058 => "SSR GPS Clock Correction",
        1059 => "SSR GPS Code Bias",
        1060 => "SSR GPS Combined Orbit and Clock Corrections",
        1061 => "SSR GPS URA",
        1062 => "SSR GPS High Rate Clock Correction",
        1063 => "SSR GLONASS Orbit Correction",
        1064 => "SSR GLONASS Clock Correction",
        1065 => "SSR GLONASS Code Bias",
        1066 => "SSR GLONASS Combined Orbit and Clock Corrections",
        1067 => "SSR GLONASS URA",
        1068 => "SSR GLONASS High Rate Clock Correction",
        1071 => "GPS MSM1",
        1072 => "GPS MSM2",
        1073 => "GPS MSM3",
        1074 => "GPS MSM4",
        1075 => "GPS MSM5",
        1076 => "GPS MSM6",
        1077 => "GPS MSM7",
        1081 => "GLONASS MSM1",
        1082 => "GLONASS MSM2",
        1083 => "GLONASS MSM3",
        1084 => "GLONASS MSM4",
        1085 => "GLONASS MSM5",
        1086 => "GLONASS MSM6",
        1087 => "GLONASS MSM7",
        1091 => "Galileo MSM1",
        1092 => "Galileo MSM2",
        1093 => "Galileo MSM3",
        1094 => "Galileo MSM4",
        1095 => "Galileo MSM5",
        1096 => "Galileo MSM6",
        1097 => "Galileo MSM7",
        1101 => "SBAS MSM1",
        1102 => "SBAS MSM2",
        1103 => "SBAS MSM3",
        1104 => "SBAS MSM4",
        1105 => "SBAS MSM5",
        1106 => "SBAS MSM6",
        1107 => "SBAS MSM7",
        1111 => "QZSS MSM1",
        1112 => "QZSS MSM2",
        1113 => "QZSS MSM3",
        1114 => "QZSS MSM4",
        1115 => "QZSS MSM5",
        1116 => "QZSS MSM6",
        1117 => "QZSS MSM7",
        1121 => "BeiDou MSM1",
        1122 => "BeiDou MSM2",
        1123 => "BeiDou MSM3",
        1124 => "BeiDou MSM4",
        1125 => "BeiDou MSM5",
        1126 => "BeiDou MSM6",
        1127 => "BeiDou MSM7",
        1070 | 1078..=1080 | 1088..=1090 | 1098..=1100 | 1108..=1110 | 1118..=1120
        | 1128..=1130 => "Reserved MSM",
        1230 => "GLONASS L1 and L2 Code-Phase Biases",
        _ => "Message type not implemented",
    }
}
